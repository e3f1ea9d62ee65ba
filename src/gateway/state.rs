use std::sync::Arc;

use crate::auth::{Authenticator, ChallengeService, SessionService, TokenCodec};
use crate::captcha::CaptchaVerifier;
use crate::config::{AppConfig, CaptchaConfig, MetaConfig};
use crate::db::Store;
use crate::player::PlayerStatusHub;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Persistence behind the repository traits; Postgres in production,
    /// in-memory in dev/tests.
    pub store: Arc<dyn Store>,
    pub challenges: ChallengeService,
    pub sessions: SessionService,
    pub codec: TokenCodec,
    pub auth: Authenticator,
    /// Present only when captcha gating is enabled in config.
    pub captcha: Option<CaptchaVerifier>,
    pub captcha_config: CaptchaConfig,
    pub player: Arc<PlayerStatusHub>,
    pub meta: MetaConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        let challenges = ChallengeService::new(store.clone());
        let sessions = SessionService::new(store.clone());
        let codec = TokenCodec::new(&config.crypto_secret);
        let auth = Authenticator::new(sessions.clone(), codec.clone());

        let captcha = config.captcha.enabled.then(|| {
            CaptchaVerifier::new(
                config.captcha.verify_url.clone(),
                config.captcha.secret.clone(),
            )
        });

        Self {
            store,
            challenges,
            sessions,
            codec,
            auth,
            captcha,
            captcha_config: config.captcha.clone(),
            player: Arc::new(PlayerStatusHub::new()),
            meta: config.meta.clone(),
        }
    }
}
