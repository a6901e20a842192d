use axum::{http::StatusCode, Json};
use crate::models::ErrorResponse;

const ADMIN_ROLE: &str = "admin";

pub fn is_admin(roles: &Vec<String>) -> bool {
    roles.iter().any(|r| r == ADMIN_ROLE)
}

pub fn ensure_admin(roles: &Vec<String>) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    if is_admin(roles) {
        return Ok(ADMIN_ROLE.to_string());
    }

    let status = StatusCode::FORBIDDEN;
    Err((status, Json(ErrorResponse {
        code: status.as_u16(),
        status: status.to_string(),
        error: "Admin access required".to_string(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_is_recognized() {
        let roles = vec!["user".to_string(), "admin".to_string()];
        assert!(is_admin(&roles));
        assert!(ensure_admin(&roles).is_ok());
    }

    #[test]
    fn non_admin_is_forbidden() {
        let roles = vec!["user".to_string()];
        assert!(!is_admin(&roles));
        let err = ensure_admin(&roles).unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }
}
