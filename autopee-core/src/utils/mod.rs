pub mod api_token;
pub mod clock;
pub mod payment_code;
