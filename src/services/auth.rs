use crate::{
    config::Config,
    error::{AppError, Result},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AuthService {
    config: Config,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户ID
    pub iat: i64,    // 签发时间
    pub exp: i64,    // 过期时间
}

impl AuthService {
    pub async fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| AppError::Internal(format!("Stored password hash is invalid: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    pub fn generate_token(&self, user_id: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(self.config.jwt_expiry_days)).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;

        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_ref());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("Token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("Token verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 5000,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            database_url: "localhost:8000".to_string(),
            database_namespace: "quill".to_string(),
            database_name: "blog_test".to_string(),
            database_username: "root".to_string(),
            database_password: "root".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_days: 30,
            max_content_length: 50000,
            default_blogs_per_page: 10,
            cors_allowed_origins: "http://localhost:3000".to_string(),
        }
    }

    #[tokio::test]
    async fn password_hash_verifies_original_and_rejects_others() {
        let auth = AuthService::new(&test_config()).await.unwrap();

        let hash = auth.hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(auth.verify_password("hunter2", &hash).unwrap());
        assert!(!auth.verify_password("hunter3", &hash).unwrap());
    }

    #[tokio::test]
    async fn token_round_trips_subject_with_30_day_expiry() {
        let auth = AuthService::new(&test_config()).await.unwrap();

        let token = auth.generate_token("user:abc").unwrap();
        let claims = auth.verify_token(&token).unwrap();

        assert_eq!(claims.sub, "user:abc");
        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, 30 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let auth = AuthService::new(&test_config()).await.unwrap();

        let token = auth.generate_token("user:abc").unwrap();
        let mut tampered = token.clone();
        tampered.push('x');

        assert!(auth.verify_token(&tampered).is_err());
        assert!(auth.verify_token("not-a-token").is_err());
    }
}
