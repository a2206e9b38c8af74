use serde::Deserialize;

/// Editable profile fields. Password, id, role and created_at are never
/// writable through this endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}
