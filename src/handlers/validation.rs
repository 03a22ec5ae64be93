use crate::domain::order::{CustomerInfo, DeliveryInfo};
use crate::errors::AppError;

use super::orders::{CreateOrderRequest, PaymentRequest};

/// Field-level checks applied to request bodies before they reach the
/// order service.
pub trait Validate {
    fn collect_violations(&self, prefix: &str, out: &mut Vec<String>);

    fn validate(&self) -> Result<(), AppError> {
        let mut violations = Vec::new();
        self.collect_violations("", &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::BadRequest(violations.join("; ")))
        }
    }
}

fn require_non_blank(field: &str, value: &str, out: &mut Vec<String>) {
    if value.trim().is_empty() {
        out.push(format!("{field} must not be blank"));
    }
}

fn require_digits(field: &str, value: &str, lengths: &[usize], out: &mut Vec<String>) {
    let value = value.trim();
    if !value.chars().all(|c| c.is_ascii_digit()) || !lengths.contains(&value.len()) {
        out.push(format!("{field} is not valid"));
    }
}

impl Validate for CustomerInfo {
    fn collect_violations(&self, prefix: &str, out: &mut Vec<String>) {
        require_non_blank(&format!("{prefix}firstName"), &self.first_name, out);
        require_non_blank(&format!("{prefix}lastName"), &self.last_name, out);
        require_non_blank(&format!("{prefix}email"), &self.email, out);
        require_non_blank(&format!("{prefix}phoneNumber"), &self.phone_number, out);
        if !self.email.trim().is_empty() && !self.email.contains('@') {
            out.push(format!("{prefix}email is not valid"));
        }
    }
}

impl Validate for DeliveryInfo {
    fn collect_violations(&self, prefix: &str, out: &mut Vec<String>) {
        require_non_blank(&format!("{prefix}address"), &self.address, out);
        require_non_blank(&format!("{prefix}city"), &self.city, out);
        require_non_blank(&format!("{prefix}postalCode"), &self.postal_code, out);
        require_non_blank(&format!("{prefix}country"), &self.country, out);
    }
}

impl Validate for CreateOrderRequest {
    fn collect_violations(&self, prefix: &str, out: &mut Vec<String>) {
        self.customer_info
            .collect_violations(&format!("{prefix}customerInfo."), out);
        self.delivery_info
            .collect_violations(&format!("{prefix}deliveryInfo."), out);
    }
}

impl Validate for PaymentRequest {
    fn collect_violations(&self, prefix: &str, out: &mut Vec<String>) {
        require_digits(
            &format!("{prefix}cardNumber"),
            &self.card_number,
            &[12, 13, 14, 15, 16, 17, 18, 19],
            out,
        );
        let month = self.expiry_month.trim();
        let month_ok = month.len() == 2
            && month
                .parse::<u8>()
                .map(|m| (1..=12).contains(&m))
                .unwrap_or(false);
        if !month_ok {
            out.push(format!("{prefix}expiryMonth is not valid"));
        }
        require_digits(&format!("{prefix}expiryYear"), &self.expiry_year, &[2, 4], out);
        require_digits(&format!("{prefix}cvv"), &self.cvv, &[3, 4], out);
        require_non_blank(&format!("{prefix}cardHolder"), &self.card_holder, out);
    }
}
