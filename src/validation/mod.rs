use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    settings::AdvancedSettings,
};

pub mod admin;

/// Contact fields as typed by the buyer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Contact fields after validation. Fields the router does not collect are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
}

/// Validate a buyer's contact form against the router's collection flags.
///
/// A phone number is always needed since it keys the customer record; when
/// the router does not ask for one the purchase is refused.
pub fn validate_contact(settings: &AdvancedSettings, form: &ContactForm) -> Result<Contact> {
    let name = if settings.collect_name {
        non_empty(form.name.as_deref())
    } else {
        None
    };
    if settings.collect_name && settings.require_name && name.is_none() {
        return Err(AppError::Validation("Please enter your name".to_string()));
    }

    let phone = if settings.collect_phone {
        non_empty(form.phone.as_deref())
    } else {
        None
    };
    let phone = match phone {
        Some(raw) => normalize_phone(&raw)
            .ok_or_else(|| AppError::Validation("Please enter a valid phone number".to_string()))?,
        None if settings.collect_phone && settings.require_phone => {
            return Err(AppError::Validation(
                "Please enter your phone number".to_string(),
            ));
        }
        None => {
            return Err(AppError::Validation(
                "A phone number is needed to deliver your code".to_string(),
            ));
        }
    };

    let email = if settings.collect_email {
        non_empty(form.email.as_deref())
    } else {
        None
    };
    match &email {
        Some(addr) if !is_valid_email(addr) => {
            return Err(AppError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }
        None if settings.collect_email && settings.require_email => {
            return Err(AppError::Validation(
                "Please enter your email address".to_string(),
            ));
        }
        _ => {}
    }

    Ok(Contact { name, phone, email })
}

/// Strip separators and check the number has an optional `+` and 8 to 15 digits.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if !(8..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(compact)
}

pub fn is_valid_email(addr: &str) -> bool {
    let Some((local, domain)) = addr.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !addr.contains(char::is_whitespace)
        && domain
            .rsplit_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, phone: &str, email: &str) -> ContactForm {
        ContactForm {
            name: Some(name.to_string()),
            phone: Some(phone.to_string()),
            email: Some(email.to_string()),
        }
    }

    #[test]
    fn test_default_settings_accept_name_and_phone() {
        let contact =
            validate_contact(&AdvancedSettings::default(), &form("Aïcha", "90000000", "")).unwrap();
        assert_eq!(contact.name.as_deref(), Some("Aïcha"));
        assert_eq!(contact.phone, "90000000");
        assert_eq!(contact.email, None);
    }

    #[test]
    fn test_email_dropped_when_not_collected() {
        let contact = validate_contact(
            &AdvancedSettings::default(),
            &form("", "90 00 00 00", "not-an-email"),
        )
        .unwrap();
        assert_eq!(contact.email, None);
        assert_eq!(contact.name, None);
        assert_eq!(contact.phone, "90000000");
    }

    #[test]
    fn test_missing_required_phone() {
        let err = validate_contact(&AdvancedSettings::default(), &form("A", "  ", "")).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("phone")));
    }

    #[test]
    fn test_malformed_phone() {
        let err =
            validate_contact(&AdvancedSettings::default(), &form("A", "12ab5678", "")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(normalize_phone("1234567").is_none());
        assert_eq!(normalize_phone("+229 90-00-00-00").as_deref(), Some("+22990000000"));
    }

    #[test]
    fn test_required_email_and_name() {
        let settings = AdvancedSettings {
            require_name: true,
            collect_email: true,
            require_email: true,
            ..AdvancedSettings::default()
        };
        assert!(validate_contact(&settings, &form("", "90000000", "a@b.co")).is_err());
        assert!(validate_contact(&settings, &form("Kofi", "90000000", "")).is_err());
        assert!(validate_contact(&settings, &form("Kofi", "90000000", "a@b")).is_err());
        let ok = validate_contact(&settings, &form("Kofi", "90000000", "a@b.co")).unwrap();
        assert_eq!(ok.email.as_deref(), Some("a@b.co"));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("kofi@example.com"));
        assert!(!is_valid_email("kofi@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ko fi@example.com"));
    }
}
