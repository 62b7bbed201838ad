use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{Category, CategoryChanges, CategoryTree, CategoryWithChildren, ParentFilter},
};

const CATEGORY_ORDER: &str = " ORDER BY sort_order ASC NULLS LAST, name ASC";

/// Find category by ID
pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(category)
}

/// Find category by slug
pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    Ok(category)
}

/// Flat list filtered by parent and name substring
pub async fn list(pool: &PgPool, parent: ParentFilter, name_like: Option<&str>) -> Result<Vec<Category>> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM categories WHERE 1=1");

    match parent {
        ParentFilter::Any => {}
        ParentFilter::Root => {
            query.push(" AND parent_id IS NULL");
        }
        ParentFilter::Parent(parent_id) => {
            query.push(" AND parent_id = ");
            query.push_bind(parent_id);
        }
    }

    if let Some(q) = name_like {
        query.push(" AND name ILIKE ");
        query.push_bind(format!("%{}%", escape_like(q)));
    }

    query.push(CATEGORY_ORDER);

    let categories = query.build_query_as::<Category>().fetch_all(pool).await?;

    Ok(categories)
}

/// Get all categories (flat list)
pub async fn get_all(pool: &PgPool) -> Result<Vec<Category>> {
    list(pool, ParentFilter::Any, None).await
}

/// Direct children of a category
pub async fn get_children(pool: &PgPool, parent_id: i32) -> Result<Vec<Category>> {
    list(pool, ParentFilter::Parent(parent_id), None).await
}

/// Get category tree (hierarchical structure)
pub async fn get_category_tree(pool: &PgPool) -> Result<CategoryTree> {
    let categories = get_all(pool).await?;

    Ok(build_tree(categories))
}

pub fn build_tree(categories: Vec<Category>) -> CategoryTree {
    // Group categories by parent_id, preserving query order
    let mut children_map: HashMap<Option<i32>, Vec<Category>> = HashMap::new();
    for category in categories {
        children_map
            .entry(category.parent_id)
            .or_default()
            .push(category);
    }

    fn build_level(
        parent_id: Option<i32>,
        children_map: &HashMap<Option<i32>, Vec<Category>>,
    ) -> Vec<CategoryWithChildren> {
        children_map
            .get(&parent_id)
            .map(|categories| {
                categories
                    .iter()
                    .map(|cat| CategoryWithChildren {
                        children: build_level(Some(cat.id), children_map),
                        category: cat.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    CategoryTree {
        categories: build_level(None, &children_map),
    }
}

/// Create a new category
pub async fn create_category(
    pool: &PgPool,
    name: &str,
    slug: &str,
    parent_id: Option<i32>,
    sort_order: Option<i32>,
) -> Result<Category> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, slug, parent_id, sort_order)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(name)
    .bind(slug)
    .bind(parent_id)
    .bind(sort_order)
    .fetch_one(pool)
    .await?;

    Ok(category)
}

/// Update an existing category
pub async fn update_category(
    pool: &PgPool,
    id: i32,
    changes: CategoryChanges,
) -> Result<Option<Category>> {
    let mut query_builder = QueryBuilder::<Postgres>::new("UPDATE categories SET ");
    let mut fields = query_builder.separated(", ");

    if let Some(name) = changes.name {
        fields.push("name = ");
        fields.push_bind_unseparated(name);
    }

    if let Some(slug) = changes.slug {
        fields.push("slug = ");
        fields.push_bind_unseparated(slug);
    }

    if let Some(parent_id) = changes.parent_id {
        fields.push("parent_id = ");
        fields.push_bind_unseparated(parent_id);
    }

    if let Some(sort_order) = changes.sort_order {
        fields.push("sort_order = ");
        fields.push_bind_unseparated(sort_order);
    }

    fields.push("updated_at = NOW()");

    query_builder.push(" WHERE id = ");
    query_builder.push_bind(id);
    query_builder.push(" RETURNING *");

    let category = query_builder
        .build_query_as::<Category>()
        .fetch_optional(pool)
        .await?;

    Ok(category)
}

/// True when `ancestor_id` is `category_id` itself or one of its ancestors
pub async fn is_self_or_ancestor(pool: &PgPool, ancestor_id: i32, category_id: i32) -> Result<bool> {
    let found: bool = sqlx::query_scalar(
        "WITH RECURSIVE chain AS (
             SELECT id, parent_id FROM categories WHERE id = $2
             UNION
             SELECT c.id, c.parent_id FROM categories c
             INNER JOIN chain ON c.id = chain.parent_id
         )
         SELECT EXISTS (SELECT 1 FROM chain WHERE id = $1)",
    )
    .bind(ancestor_id)
    .bind(category_id)
    .fetch_one(pool)
    .await?;

    Ok(found)
}

/// Delete a category
pub async fn delete_category(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_products(pool: &PgPool, id: i32) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Escapes `%`, `_` and `\` so user input matches literally inside LIKE patterns.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
