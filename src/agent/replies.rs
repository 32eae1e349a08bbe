//! User-facing reply texts

use crate::pricing::PriceError;

pub const GREETING: &str =
    "Hello! I can help you check cryptocurrency prices or answer general questions.";

pub const EXIT_HINT: &str = "Type 'exit' to end the conversation.";

pub const GOODBYE: &str = "Goodbye!";

pub const CRYPTO_INTRO: &str = "Hello! You are interacting with a cryptocurrency expert. I can provide real-time crypto prices and answer related questions. If you misspell a crypto name, I will correct it for you.";

pub const LANGUAGE_ACK: &str = "I have noted your language change request. You can continue using the new language, but I will respond in English to ensure consistency and clarity.";

pub const RATE_LIMITED: &str = "Rate limit exceeded. Please wait a moment before trying again.";

pub const PRICING_UNAVAILABLE: &str =
    "Sorry, I couldn't reach the pricing service right now. Please try again later.";

pub const GENERIC_APOLOGY: &str =
    "Sorry, something went wrong while preparing a reply. Please try again.";

/// `f64` Display keeps whole prices free of a trailing `.0`
pub fn price_reply(coin: &str, price: f64) -> String {
    format!("The current price of {coin} is ${price} USD.")
}

pub fn coin_not_found(coin: &str) -> String {
    format!("Sorry, I couldn't find a price for '{coin}'. Please check the coin name and try again.")
}

pub fn price_error_reply(coin: &str, err: &PriceError) -> String {
    if err.is_rate_limited() {
        RATE_LIMITED.to_string()
    } else if err.is_lookup_failure() {
        coin_not_found(coin)
    } else {
        PRICING_UNAVAILABLE.to_string()
    }
}
