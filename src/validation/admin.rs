use crate::{
    db::models::{CreateProfileRequest, CreateRouterRequest, ImportCodesRequest, UpdateProfileRequest},
    error::{AppError, Result},
};

pub fn check_router(req: &CreateRouterRequest) -> Result<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Router name is required".to_string()));
    }
    Ok(())
}

pub fn check_new_profile(req: &CreateProfileRequest) -> Result<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Profile name is required".to_string()));
    }
    check_price(req.price)?;
    if req.duration.trim().is_empty() {
        return Err(AppError::Validation("Profile duration is required".to_string()));
    }
    Ok(())
}

pub fn check_profile_update(req: &UpdateProfileRequest) -> Result<()> {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Validation("Profile name cannot be empty".to_string()));
    }
    if let Some(price) = req.price {
        check_price(price)?;
    }
    Ok(())
}

fn check_price(price: i64) -> Result<()> {
    if price <= 0 {
        return Err(AppError::Validation("Price must be a positive amount".to_string()));
    }
    Ok(())
}

pub fn check_import(req: &ImportCodesRequest) -> Result<()> {
    if req.codes.is_empty() {
        return Err(AppError::Validation("No codes to import".to_string()));
    }
    if let Some(pos) = req
        .codes
        .iter()
        .position(|c| c.username.trim().is_empty() || c.password.trim().is_empty())
    {
        return Err(AppError::Validation(format!(
            "Code #{} is missing a username or password",
            pos + 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::VoucherCredentials;

    fn profile(name: &str, price: i64, duration: &str) -> CreateProfileRequest {
        CreateProfileRequest {
            name: name.to_string(),
            description: None,
            price,
            duration: duration.to_string(),
            enabled: None,
            visible_on_buy_page: None,
        }
    }

    #[test]
    fn test_profile_checks() {
        assert!(check_new_profile(&profile("1 jour", 200, "1 jour")).is_ok());
        assert!(check_new_profile(&profile("", 200, "1 jour")).is_err());
        assert!(check_new_profile(&profile("x", 0, "1 jour")).is_err());
        assert!(check_new_profile(&profile("x", 100, " ")).is_err());

        let update = UpdateProfileRequest {
            price: Some(-5),
            ..Default::default()
        };
        assert!(check_profile_update(&update).is_err());
    }

    #[test]
    fn test_import_reports_bad_row() {
        let req = ImportCodesRequest {
            profile_id: "p".to_string(),
            codes: vec![
                VoucherCredentials {
                    username: "u1".to_string(),
                    password: "p1".to_string(),
                },
                VoucherCredentials {
                    username: "u2".to_string(),
                    password: "".to_string(),
                },
            ],
        };
        let err = check_import(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("#2")));
    }
}
