//! Checkout form, validation and the WhatsApp order message.

use partfruit_core::{NewOrder, PaymentMethod, Price};
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::CheckoutError;
use crate::platform::Position;

const LOCATION_NOT_SET: &str = "ثبت نشده";

/// State of the checkout overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutForm {
    pub phone: String,
    /// Set once a verification code was requested; the code must then match.
    pub code_requested: bool,
    pub code: String,
    pub address: String,
    pub location: Option<Position>,
    pub payment_method: PaymentMethod,
    /// Receipt as a `data:` URL.
    pub receipt_image: Option<String>,
    idempotency_key: String,
    /// Last order submitted under `idempotency_key`.
    submitted: Option<NewOrder>,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            phone: String::new(),
            code_requested: false,
            code: String::new(),
            address: String::new(),
            location: None,
            payment_method: PaymentMethod::CashOnDelivery,
            receipt_image: None,
            idempotency_key: Uuid::new_v4().to_string(),
            submitted: None,
        }
    }
}

impl CheckoutForm {
    /// A blank form with a fresh idempotency key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Key sent with every submission of this form.
    #[must_use]
    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }

    /// Key to submit `order` with.
    ///
    /// Retrying the same order reuses the key. Once the order changes (cart,
    /// address, payment method) a new key is issued.
    pub fn key_for(&mut self, order: &NewOrder) -> &str {
        if self.submitted.as_ref().is_some_and(|previous| previous != order) {
            self.idempotency_key = Uuid::new_v4().to_string();
        }
        self.submitted = Some(order.clone());
        &self.idempotency_key
    }

    /// Check the form before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: address, then code, then receipt.
    pub fn validate(&self, expected_code: &str) -> Result<(), CheckoutError> {
        if self.address.trim().is_empty() {
            return Err(CheckoutError::MissingAddress);
        }
        if self.code_requested && self.code.trim() != expected_code {
            return Err(CheckoutError::WrongCode);
        }
        let has_receipt = self.receipt_image.as_deref().is_some_and(|r| !r.is_empty());
        if self.payment_method.requires_receipt() && !has_receipt {
            return Err(CheckoutError::MissingReceipt);
        }
        Ok(())
    }

    /// The order this form submits for `cart`.
    #[must_use]
    pub fn to_order(&self, cart: &Cart) -> NewOrder {
        NewOrder {
            customer_phone: self.phone.trim().to_owned(),
            items: cart.order_items(),
            total_price: cart.total(),
            address: self.address.clone(),
            latitude: self.location.map(|p| p.latitude),
            longitude: self.location.map(|p| p.longitude),
            payment_method: self.payment_method,
            receipt_image: self
                .receipt_image
                .clone()
                .filter(|_| self.payment_method.requires_receipt()),
        }
    }
}

/// How the payment method reads in the order message.
#[must_use]
pub const fn payment_text(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::CashOnDelivery => "پرداخت در محل",
        PaymentMethod::HostedCheckout => "پرداخت آنلاین",
        PaymentMethod::ManualTransfer => "واریز موبایلی (رسید پیوست شد)",
    }
}

/// Short payment label for the admin order list.
#[must_use]
pub const fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::CashOnDelivery => "در محل",
        PaymentMethod::HostedCheckout => "آنلاین",
        PaymentMethod::ManualTransfer => "انتقال موبایلی",
    }
}

/// An amount without trailing zeros (`3.5`, `12`).
#[must_use]
pub fn format_amount(amount: Price) -> String {
    amount.amount().normalize().to_string()
}

/// Map link for a captured position, or the "not set" marker.
#[must_use]
pub fn location_text(location: Option<Position>) -> String {
    location.map_or_else(
        || LOCATION_NOT_SET.to_owned(),
        |p| format!("https://www.google.com/maps?q={},{}", p.latitude, p.longitude),
    )
}

/// The order summary sent to the shop over WhatsApp.
#[must_use]
pub fn order_message(form: &CheckoutForm, cart: &Cart) -> String {
    let items = cart
        .lines()
        .iter()
        .map(|line| format!("{} ({} عدد)", line.product.name, line.quantity))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "سفارش جدید از پارت فروت:\n\nمحصولات:\n{items}\n\nجمع کل: {total} ریال\nروش پرداخت: {payment}\nآدرس: {address}\nلوکیشن: {location}\nتلفن: {phone}",
        total = format_amount(cart.total()),
        payment = payment_text(form.payment_method),
        address = form.address,
        location = location_text(form.location),
        phone = form.phone,
    )
}

/// `wa.me` deep link to `number` with `message` pre-filled.
#[must_use]
pub fn whatsapp_link(number: &str, message: &str) -> String {
    format!("https://wa.me/{number}?text={}", urlencoding::encode(message))
}

/// Instructions shown when manual transfer is selected.
#[must_use]
pub fn transfer_instructions(number: &str) -> String {
    format!("لطفا مبلغ را به شماره {number} واریز کرده و تصویر رسید را آپلود کنید.")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::tests::product;

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            phone: "96890000000".to_string(),
            address: "الخوير، مسقط".to_string(),
            ..CheckoutForm::new()
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        let apple = product(1, "سیب", 1.5);
        cart.add(&apple);
        cart.add(&apple);
        cart.add(&product(2, "موز", 0.5));
        cart
    }

    #[test]
    fn test_address_is_checked_first() {
        let form = CheckoutForm {
            code_requested: true,
            payment_method: PaymentMethod::ManualTransfer,
            ..CheckoutForm::new()
        };
        assert_eq!(form.validate("1234"), Err(CheckoutError::MissingAddress));
    }

    #[test]
    fn test_code_only_checked_when_requested() {
        let mut form = filled_form();
        form.code = "9999".to_string();
        assert_eq!(form.validate("1234"), Ok(()));

        form.code_requested = true;
        assert_eq!(form.validate("1234"), Err(CheckoutError::WrongCode));

        form.code = "1234".to_string();
        assert_eq!(form.validate("1234"), Ok(()));
    }

    #[test]
    fn test_code_ignores_surrounding_whitespace() {
        let mut form = filled_form();
        form.code_requested = true;
        form.code = " 1234\n".to_string();
        assert_eq!(form.validate("1234"), Ok(()));

        form.code = "12 34".to_string();
        assert_eq!(form.validate("1234"), Err(CheckoutError::WrongCode));
    }

    #[test]
    fn test_manual_transfer_needs_receipt() {
        let mut form = filled_form();
        form.payment_method = PaymentMethod::ManualTransfer;
        assert_eq!(form.validate("1234"), Err(CheckoutError::MissingReceipt));

        form.receipt_image = Some(String::new());
        assert_eq!(form.validate("1234"), Err(CheckoutError::MissingReceipt));

        form.receipt_image = Some("data:image/png;base64,AAAA".to_string());
        assert_eq!(form.validate("1234"), Ok(()));
    }

    #[test]
    fn test_changed_order_gets_a_new_key() {
        let mut form = filled_form();
        let order = form.to_order(&cart());

        let first = form.key_for(&order).to_owned();
        assert_eq!(form.key_for(&order), first);

        form.payment_method = PaymentMethod::HostedCheckout;
        let changed = form.to_order(&cart());
        let second = form.key_for(&changed).to_owned();
        assert_ne!(second, first);
        assert_eq!(form.key_for(&changed), second);
    }

    #[test]
    fn test_each_form_gets_its_own_key() {
        assert_ne!(
            CheckoutForm::new().idempotency_key(),
            CheckoutForm::new().idempotency_key()
        );
    }

    #[test]
    fn test_to_order_uses_cart_total_and_drops_stray_receipt() {
        let mut form = filled_form();
        form.receipt_image = Some("data:image/png;base64,AAAA".to_string());
        form.location = Some(Position {
            latitude: 23.5,
            longitude: 58.4,
        });

        let order = form.to_order(&cart());
        assert_eq!(order.total_price, Price::from_f64(3.5).unwrap());
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.latitude, Some(23.5));
        assert_eq!(order.receipt_image, None);
    }

    #[test]
    fn test_order_message() {
        let mut form = filled_form();
        form.location = Some(Position {
            latitude: 23.588,
            longitude: 58.3829,
        });

        let message = order_message(&form, &cart());
        assert_eq!(
            message,
            "سفارش جدید از پارت فروت:\n\nمحصولات:\nسیب (2 عدد)\nموز (1 عدد)\n\nجمع کل: 3.5 ریال\nروش پرداخت: پرداخت در محل\nآدرس: الخوير، مسقط\nلوکیشن: https://www.google.com/maps?q=23.588,58.3829\nتلفن: 96890000000"
        );
    }

    #[test]
    fn test_message_without_location() {
        let mut form = filled_form();
        form.payment_method = PaymentMethod::ManualTransfer;
        let message = order_message(&form, &cart());
        assert!(message.contains("لوکیشن: ثبت نشده"));
        assert!(message.contains("روش پرداخت: واریز موبایلی (رسید پیوست شد)"));
    }

    #[test]
    fn test_whatsapp_link_is_percent_encoded() {
        let link = whatsapp_link("96800000000", "سلام\nجمع کل: 3.5");
        assert!(link.starts_with("https://wa.me/96800000000?text="));
        let encoded = link.split_once("?text=").unwrap().1;
        assert!(!encoded.contains(' ') && !encoded.contains('\n'));
        assert_eq!(urlencoding::decode(encoded).unwrap(), "سلام\nجمع کل: 3.5");
    }

    #[test]
    fn test_format_amount_trims_zeros() {
        assert_eq!(format_amount(Price::from_f64(12.0).unwrap()), "12");
        assert_eq!(format_amount(Price::from_f64(0.75).unwrap()), "0.75");
    }
}
