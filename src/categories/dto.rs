use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AddCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameCategoryRequest {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCategoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CascadeResponse {
    pub categories: Vec<String>,
    /// Owned projects whose tag was rewritten by the cascade.
    pub projects_updated: u64,
}
