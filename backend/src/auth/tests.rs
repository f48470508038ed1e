use super::*;
use axum::http::Request;
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";
const USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

fn claims(role: &str, exp: usize) -> Claims {
    Claims {
        sub: USER_ID.to_string(),
        role: role.to_string(),
        email: Some("test@example.com".to_string()),
        aud: "authenticated".to_string(),
        exp,
    }
}

fn token_with(secret: &str, claims: &Claims) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

async fn extract(authorization: Option<String>) -> Result<AuthUser, AuthError> {
    let mut builder = Request::builder().uri("/api/v1/subscriptions");
    if let Some(value) = authorization {
        builder = builder.header(axum::http::header::AUTHORIZATION, value);
    }
    let request = builder
        .extension(Arc::new(JwtVerifier::new(SECRET)))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    AuthUser::from_request_parts(&mut parts, &()).await
}

#[test]
fn test_validate_jwt_success() {
    let my_claims = claims("authenticated", 9999999999);
    let token = token_with(SECRET, &my_claims);

    let claims = JwtVerifier::new(SECRET)
        .validate(&token)
        .expect("Valid token should pass");
    assert_eq!(claims.sub, my_claims.sub);
    assert_eq!(claims.email, my_claims.email);
}

#[test]
fn test_validate_jwt_expired() {
    let token = token_with(SECRET, &claims("authenticated", 1));

    assert!(JwtVerifier::new(SECRET).validate(&token).is_err());
}

#[test]
fn test_validate_jwt_invalid_signature() {
    let token = token_with("wrongsecret", &claims("authenticated", 9999999999));

    assert!(JwtVerifier::new(SECRET).validate(&token).is_err());
}

#[test]
fn test_validate_jwt_unknown_audience() {
    let mut my_claims = claims("authenticated", 9999999999);
    my_claims.aud = "anon".to_string();
    let token = token_with(SECRET, &my_claims);

    assert!(JwtVerifier::new(SECRET).validate(&token).is_err());
}

#[tokio::test]
async fn extractor_builds_auth_user_from_bearer_token() {
    let token = token_with(SECRET, &claims("authenticated", 9999999999));

    let user = extract(Some(format!("Bearer {token}"))).await.unwrap();

    assert_eq!(user.user_id, Uuid::parse_str(USER_ID).unwrap());
    assert_eq!(user.email.as_deref(), Some("test@example.com"));
    assert!(!user.is_admin());
}

#[tokio::test]
async fn extractor_marks_service_role_as_admin() {
    let token = token_with(SECRET, &claims("service_role", 9999999999));

    let user = extract(Some(format!("Bearer {token}"))).await.unwrap();

    assert!(user.is_admin());
}

#[tokio::test]
async fn extractor_rejects_missing_header() {
    assert!(extract(None).await.is_err());
}

#[tokio::test]
async fn extractor_rejects_malformed_header() {
    let token = token_with(SECRET, &claims("authenticated", 9999999999));

    assert!(extract(Some(format!("Token {token}"))).await.is_err());
    assert!(extract(Some("Bearer ".to_string())).await.is_err());
}

#[tokio::test]
async fn extractor_rejects_non_uuid_subject() {
    let mut my_claims = claims("authenticated", 9999999999);
    my_claims.sub = "not-a-uuid".to_string();
    let token = token_with(SECRET, &my_claims);

    assert!(extract(Some(format!("Bearer {token}"))).await.is_err());
}
