use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{
        DEFAULT_PAGE_SIZE, NewProduct, Page, ProductChanges, ProductImageData, ProductQuery,
        ProductRow, ProductView, SortBy, page_window,
    },
    queries::category_queries::escape_like,
};

const PRODUCT_SELECT: &str = "SELECT
        p.id, p.name, p.sku, p.price, p.description, p.characteristics, p.specifications,
        p.image_url, p.image_mime_type, p.images, p.brand_id, p.category_id,
        p.created_at, p.updated_at,
        b.name AS brand_name,
        c.name AS category_name,
        c.slug AS category_slug,
        r.avg_rating,
        COALESCE(r.ratings_count, 0) AS ratings_count
     FROM products p
     LEFT JOIN brands b ON b.id = p.brand_id
     LEFT JOIN categories c ON c.id = p.category_id
     LEFT JOIN (
        SELECT product_id, AVG(rating)::float8 AS avg_rating, COUNT(*) AS ratings_count
        FROM product_ratings
        GROUP BY product_id
     ) r ON r.product_id = p.id";

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<ProductView>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(PRODUCT_SELECT);
    query.push(" WHERE p.id = ");
    query.push_bind(id);

    let product = query
        .build_query_as::<ProductRow>()
        .fetch_optional(pool)
        .await?;

    Ok(product.map(ProductView::from))
}

pub async fn exists(pool: &PgPool, id: i32) -> Result<bool> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(found)
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &ProductQuery) {
    query.push(" WHERE 1=1");

    // text search
    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(q));
        query.push(" AND (p.name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR p.sku ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(brand_id) = params.brand_id {
        query.push(" AND p.brand_id = ");
        query.push_bind(brand_id);
    }

    if let Some(category_id) = params.category_id {
        query.push(" AND p.category_id = ");
        query.push_bind(category_id);
    }

    // price range
    if let Some(min_price) = params.min_price {
        query.push(" AND p.price >= ");
        query.push_bind(min_price);
    }

    if let Some(max_price) = params.max_price {
        query.push(" AND p.price <= ");
        query.push_bind(max_price);
    }
}

pub async fn search_products(pool: &PgPool, params: &ProductQuery) -> Result<Page<ProductView>> {
    let has_text_search = params
        .q
        .as_deref()
        .is_some_and(|q| !q.trim().is_empty());
    let sort = SortBy::from_param(params.sort.as_deref());
    let (limit, offset) = page_window(params.limit, params.offset, DEFAULT_PAGE_SIZE);

    let mut count_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM products p");
    push_filters(&mut count_query, params);
    let count: i64 = count_query
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(PRODUCT_SELECT);
    push_filters(&mut query, params);

    // sort
    query.push(" ORDER BY ");
    query.push(sort.order_clause(has_text_search));

    // pagination
    query.push(" LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let rows = query.build_query_as::<ProductRow>().fetch_all(pool).await?;

    Ok(Page {
        count,
        items: rows.into_iter().map(ProductView::from).collect(),
    })
}

/// Best-rated products with at least `min_ratings` ratings.
pub async fn featured_products(
    pool: &PgPool,
    limit: i64,
    min_ratings: i64,
) -> Result<Vec<ProductView>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(PRODUCT_SELECT);
    query.push(" WHERE COALESCE(r.ratings_count, 0) >= ");
    query.push_bind(min_ratings);
    query.push(" ORDER BY r.avg_rating DESC NULLS LAST, p.created_at DESC, p.id DESC LIMIT ");
    query.push_bind(limit);

    let rows = query.build_query_as::<ProductRow>().fetch_all(pool).await?;

    Ok(rows.into_iter().map(ProductView::from).collect())
}

pub async fn find_image(pool: &PgPool, id: i32) -> Result<Option<ProductImageData>> {
    let image = sqlx::query_as::<_, ProductImageData>(
        "SELECT image_data, image_mime_type, image_url FROM products WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(image)
}

pub async fn create_product(pool: &PgPool, product: NewProduct) -> Result<i32> {
    let (image_data, image_mime_type) = match product.image {
        Some(image) => (Some(image.data), Some(image.mime_type)),
        None => (None, None),
    };

    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO products (
            name, sku, price, description, characteristics, specifications,
            image_url, image_data, image_mime_type, images, brand_id, category_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        "#,
    )
    .bind(&product.name)
    .bind(&product.sku)
    .bind(product.price)
    .bind(&product.description)
    .bind(&product.characteristics)
    .bind(&product.specifications)
    .bind(&product.image_url)
    .bind(image_data)
    .bind(image_mime_type)
    .bind(&product.images)
    .bind(product.brand_id)
    .bind(product.category_id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn update_product(pool: &PgPool, id: i32, changes: ProductChanges) -> Result<bool> {
    let mut query_builder = QueryBuilder::<Postgres>::new("UPDATE products SET ");
    let mut fields = query_builder.separated(", ");

    if let Some(name) = changes.name {
        fields.push("name = ");
        fields.push_bind_unseparated(name);
    }

    if let Some(sku) = changes.sku {
        fields.push("sku = ");
        fields.push_bind_unseparated(sku);
    }

    if let Some(price) = changes.price {
        fields.push("price = ");
        fields.push_bind_unseparated(price);
    }

    if let Some(description) = changes.description {
        fields.push("description = ");
        fields.push_bind_unseparated(description);
    }

    if let Some(characteristics) = changes.characteristics {
        fields.push("characteristics = ");
        fields.push_bind_unseparated(characteristics);
    }

    if let Some(specifications) = changes.specifications {
        fields.push("specifications = ");
        fields.push_bind_unseparated(specifications);
    }

    if let Some(image_url) = changes.image_url {
        fields.push("image_url = ");
        fields.push_bind_unseparated(image_url);
    }

    if let Some(images) = changes.images {
        fields.push("images = ");
        fields.push_bind_unseparated(images);
    }

    if let Some(brand_id) = changes.brand_id {
        fields.push("brand_id = ");
        fields.push_bind_unseparated(brand_id);
    }

    if let Some(category_id) = changes.category_id {
        fields.push("category_id = ");
        fields.push_bind_unseparated(category_id);
    }

    fields.push("updated_at = NOW()");

    query_builder.push(" WHERE id = ");
    query_builder.push_bind(id);

    let result = query_builder.build().execute(pool).await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_product(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use rust_decimal::{Decimal, dec};

    use super::*;

    struct Catalog {
        tools: i32,
        paint: i32,
        acme: i32,
    }

    async fn insert_product(
        pool: &PgPool,
        name: &str,
        sku: &str,
        price: Decimal,
        category_id: i32,
        brand_id: Option<i32>,
    ) -> i32 {
        sqlx::query_scalar(
            "INSERT INTO products (name, sku, price, category_id, brand_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(name)
        .bind(sku)
        .bind(price)
        .bind(category_id)
        .bind(brand_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn catalog(pool: &PgPool) -> Catalog {
        let tools: i32 = sqlx::query_scalar(
            "INSERT INTO categories (name, slug) VALUES ('Tools', 'tools') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let paint: i32 = sqlx::query_scalar(
            "INSERT INTO categories (name, slug) VALUES ('Paint', 'paint') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let acme: i32 = sqlx::query_scalar("INSERT INTO brands (name) VALUES ('Acme') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();

        insert_product(pool, "Hammer", "HM-1", dec!(19.90), tools, Some(acme)).await;
        insert_product(pool, "Drill", "DR-1", dec!(249.90), tools, Some(acme)).await;
        insert_product(pool, "Roller", "RL-1", dec!(79.90), paint, None).await;

        Catalog { tools, paint, acme }
    }

    fn names(page: &Page<ProductView>) -> Vec<&str> {
        page.items.iter().map(|p| p.name.as_str()).collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_filters_combine(pool: PgPool) {
        let catalog = catalog(&pool).await;

        let by_brand = ProductQuery {
            brand_id: Some(catalog.acme),
            sort: Some("price_asc".to_string()),
            ..Default::default()
        };
        let page = search_products(&pool, &by_brand).await.unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(names(&page), ["Hammer", "Drill"]);

        let in_range = ProductQuery {
            min_price: Some(dec!(50)),
            max_price: Some(dec!(100)),
            ..Default::default()
        };
        assert_eq!(names(&search_products(&pool, &in_range).await.unwrap()), ["Roller"]);

        let by_category = ProductQuery {
            category_id: Some(catalog.paint),
            ..Default::default()
        };
        let page = search_products(&pool, &by_category).await.unwrap();
        assert_eq!(names(&page), ["Roller"]);
        assert_eq!(page.items[0].category.as_ref().unwrap().slug, "paint");
        assert!(page.items[0].brand.is_none());

        let by_sku = ProductQuery {
            q: Some(" dr-".to_string()),
            category_id: Some(catalog.tools),
            ..Default::default()
        };
        assert_eq!(names(&search_products(&pool, &by_sku).await.unwrap()), ["Drill"]);

        let nothing = ProductQuery {
            brand_id: Some(catalog.acme),
            category_id: Some(catalog.paint),
            ..Default::default()
        };
        let page = search_products(&pool, &nothing).await.unwrap();
        assert_eq!(page.count, 0);
        assert!(page.items.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_sort_orders_and_paging(pool: PgPool) {
        catalog(&pool).await;

        let sorted = |sort: &str| ProductQuery {
            sort: Some(sort.to_string()),
            ..Default::default()
        };

        let page = search_products(&pool, &sorted("price_desc")).await.unwrap();
        assert_eq!(names(&page), ["Drill", "Roller", "Hammer"]);

        let page = search_products(&pool, &sorted("name_asc")).await.unwrap();
        assert_eq!(names(&page), ["Drill", "Hammer", "Roller"]);

        // newest first by default, ties broken by id
        let page = search_products(&pool, &ProductQuery::default()).await.unwrap();
        assert_eq!(names(&page), ["Roller", "Drill", "Hammer"]);

        let window = ProductQuery {
            sort: Some("price_asc".to_string()),
            limit: Some(1),
            offset: Some(1),
            ..Default::default()
        };
        let page = search_products(&pool, &window).await.unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(names(&page), ["Roller"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_featured_needs_ratings(pool: PgPool) {
        catalog(&pool).await;

        let user_id: i32 = sqlx::query_scalar(
            "INSERT INTO users (first_name, last_name, email, password_hash)
             VALUES ('Carla', 'Oliveira', 'carla@example.com', 'x')
             RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO product_ratings (product_id, user_id, rating)
             SELECT id, $1, CASE sku WHEN 'HM-1' THEN 3 ELSE 5 END
             FROM products WHERE sku IN ('HM-1', 'RL-1')",
        )
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

        let featured = featured_products(&pool, 12, 1).await.unwrap();
        let featured_names: Vec<_> = featured.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(featured_names, ["Roller", "Hammer"]);
        assert_eq!(featured[0].avg_rating, Some(5.0));
        assert_eq!(featured[0].ratings_count, 1);

        assert!(featured_products(&pool, 12, 2).await.unwrap().is_empty());
    }
}
