//! The edge gatekeeper and the session manager must agree on every token.

use std::sync::Arc;

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};

use site_gate::auth::token;
use site_gate::auth::{CookieSettings, SessionManager, SharedSecret, TokenCodec, TokenPolicy};
use site_gate::clock::{Clock, ManualClock};
use site_gate::config::SiteConfig;
use site_gate::security::{EdgeDecision, Gatekeeper, PassReason};

const SECRET: &str = "parity-secret";
const NOW: u64 = 1_700_000_000_000;
const DAY_MS: u64 = 24 * 60 * 60 * 1000;

fn corpus() -> Vec<(&'static str, String)> {
    let valid = token::issue_with(SECRET, NOW - 1000);
    let (payload, signature) = valid.rsplit_once('.').unwrap();

    let mut flipped = signature.to_string();
    let first = flipped.remove(0);
    flipped.insert(0, if first == 'a' { 'b' } else { 'a' });

    vec![
        ("valid", valid.clone()),
        ("issued now", token::issue_with(SECRET, NOW)),
        ("other secret", token::issue_with("someone-else", NOW)),
        ("flipped signature", format!("{payload}.{flipped}")),
        ("uppercase signature", format!("{payload}.{}", signature.to_uppercase())),
        ("tampered payload", format!("authenticated:{}.{signature}", NOW + 5)),
        ("no separator", payload.to_string()),
        ("empty", String::new()),
        ("bare dot", ".".to_string()),
        (
            "wrong tag",
            format!("admin:{}.{}", NOW, token::sign_with(SECRET, &format!("admin:{NOW}"))),
        ),
        (
            "non-numeric issue time",
            format!("authenticated:soon.{}", token::sign_with(SECRET, "authenticated:soon")),
        ),
        ("expired", token::issue_with(SECRET, NOW - 8 * DAY_MS)),
        ("almost expired", token::issue_with(SECRET, NOW - 7 * DAY_MS + 1000)),
        ("from the future", token::issue_with(SECRET, NOW + DAY_MS)),
        ("short signature", format!("{payload}.{}", &signature[..32])),
    ]
}

#[test]
fn test_gatekeeper_and_session_manager_agree() {
    let secret = Arc::new(SharedSecret::new(SECRET));
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(NOW));
    let config = SiteConfig::default();

    let gate = Gatekeeper::from_config(&config, secret.clone()).with_clock(clock.clone());
    let sessions = SessionManager::new(
        TokenCodec::new(secret.clone())
            .with_clock(clock)
            .with_policy(TokenPolicy::with_max_age(config.auth.max_age())),
        CookieSettings::default(),
    );

    let mut accepted = 0;
    for (label, token) in corpus() {
        let cookie = format!("session={token}");
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());

        let authoritative = sessions.authenticate(&headers);
        let edge = gate.decide("/api/ai/chat", None, Some(&cookie))
            == EdgeDecision::Pass(PassReason::Authenticated);
        assert_eq!(authoritative, edge, "disagreement on {label}: {token}");
        if authoritative {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 3, "valid, issued now and almost expired pass");
}

#[test]
fn test_agree_when_secret_missing() {
    let secret = Arc::new(SharedSecret::new(SECRET));
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(NOW));
    let gate =
        Gatekeeper::from_config(&SiteConfig::default(), secret.clone()).with_clock(clock.clone());
    let sessions = SessionManager::new(
        TokenCodec::new(secret.clone()).with_clock(clock),
        CookieSettings::default(),
    );

    let cookie = format!("session={}", token::issue_with(SECRET, NOW));
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
    assert!(sessions.authenticate(&headers));

    secret.clear();
    assert!(!sessions.authenticate(&headers));
    assert!(!gate.has_valid_session(Some(&cookie)));
}
