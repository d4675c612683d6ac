// Telegram transport configuration and failure paths

use market_sentinel::services::telegram::{
    ChatTransport, RetryConfig, SendOptions, TelegramConfig, TelegramTransport,
};
use market_sentinel::utils::ErrorKind;

fn config() -> TelegramConfig {
    TelegramConfig {
        bot_token: "123456789:ABCDEF".to_string(),
        chat_id: "-1001234567890".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_empty_credentials_are_rejected() {
    let missing_token = TelegramConfig {
        bot_token: String::new(),
        ..config()
    };
    let err = TelegramTransport::new(missing_token).err().unwrap();
    assert_eq!(err.kind, ErrorKind::ConfigurationError);

    let missing_chat = TelegramConfig {
        chat_id: "  ".to_string(),
        ..config()
    };
    assert!(missing_chat.validate().is_err());
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let cfg = TelegramConfig {
        api_base_url: "not a url".to_string(),
        ..config()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_default_endpoint() {
    assert_eq!(
        config().send_message_url().unwrap().as_str(),
        "https://api.telegram.org/bot123456789:ABCDEF/sendMessage"
    );
}

#[tokio::test]
async fn test_test_mode_skips_network() {
    let cfg = TelegramConfig {
        is_test_mode: true,
        api_base_url: "http://127.0.0.1:1/".to_string(),
        ..config()
    };
    let transport = TelegramTransport::new(cfg).unwrap();

    let result = transport
        .send("<b>VIX CRASH MODE</b>", &SendOptions::default())
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_unreachable_api_reports_failure() {
    let cfg = TelegramConfig {
        api_base_url: "http://127.0.0.1:1/".to_string(),
        request_timeout_secs: 2,
        ..config()
    };
    let transport = TelegramTransport::new(cfg)
        .unwrap()
        .with_retry_config(RetryConfig::none());

    let err = transport
        .send("hello", &SendOptions::default())
        .await
        .err()
        .unwrap();
    assert!(err.is_retryable());
}
