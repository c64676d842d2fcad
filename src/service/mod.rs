pub mod announcement_service;
pub mod credit_service;
pub mod user_service;

use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Settings;
use crate::repository::*;

pub use announcement_service::AnnouncementService;
pub use credit_service::CreditService;
pub use user_service::UserService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub receipt_repo: Arc<dyn ReadReceiptRepository>,
    pub credit_repo: Arc<dyn CreditRepository>,
    pub document_repo: Arc<dyn DocumentRepository>,
    pub auth_service: Arc<AuthService>,
    pub announcement_service: Arc<AnnouncementService>,
    pub credit_service: Arc<CreditService>,
    pub user_service: Arc<UserService>,
}

impl ServiceContext {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        announcement_repo: Arc<dyn AnnouncementRepository>,
        receipt_repo: Arc<dyn ReadReceiptRepository>,
        credit_repo: Arc<dyn CreditRepository>,
        document_repo: Arc<dyn DocumentRepository>,
        auth_service: Arc<AuthService>,
        settings: &Settings,
    ) -> Self {
        let announcement_service = Arc::new(AnnouncementService::new(
            announcement_repo.clone(),
            receipt_repo.clone(),
            settings.uploads.dir.clone(),
        ));
        let credit_service = Arc::new(CreditService::new(
            credit_repo.clone(),
            user_repo.clone(),
            settings.credits.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            user_repo.clone(),
            credit_repo.clone(),
            auth_service.clone(),
            settings.uploads.clone(),
            settings.credits.clone(),
        ));

        Self {
            user_repo,
            announcement_repo,
            receipt_repo,
            credit_repo,
            document_repo,
            auth_service,
            announcement_service,
            credit_service,
            user_service,
        }
    }
}
