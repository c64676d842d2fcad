use atrium::{
    domain::{Announcement, AnnouncementType, CreateUserRequest, DocumentCategory, UserRole},
    repository::{
        AnnouncementRepository, CreditRepository, DocumentRepository, SqliteAnnouncementRepository,
        SqliteCreditRepository, SqliteDocumentRepository, SqliteUserRepository, UserRepository,
    },
    auth::AuthService,
};
use chrono::{Duration, Utc};
use clap::Parser;
use fake::{Fake, faker::internet::en::FreeEmail, faker::name::en::Name};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

#[derive(Parser)]
#[command(about = "Seed the Atrium database with demo data")]
struct Args {
    /// Number of additional fake members to create under the admin
    #[arg(long, default_value_t = 8)]
    users: usize,

    /// Database URL; falls back to DATABASE_URL, then sqlite:atrium.db
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Starting database seeding...");

    let database_url = args.database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:atrium.db".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let announcement_repo = SqliteAnnouncementRepository::new(db_pool.clone());
    let credit_repo = SqliteCreditRepository::new(db_pool.clone());
    let document_repo = SqliteDocumentRepository::new(db_pool.clone());

    println!("Creating users...");

    let admin_hash = AuthService::hash_password("admin123").await?;
    let admin = user_repo.create(CreateUserRequest {
        email: "admin@atrium.local".to_string(),
        username: "admin".to_string(),
        full_name: "Admin User".to_string(),
        password: String::new(),
        role: UserRole::Admin,
        parent_id: None,
    }, admin_hash).await?;

    println!("  Created admin user (admin@atrium.local / admin123)");

    let member_hash = AuthService::hash_password("password123").await?;
    let mut member_ids = Vec::new();
    for i in 0..args.users {
        let full_name: String = Name().fake();
        let email: String = FreeEmail().fake();
        let username = format!("member{:02}", i + 1);

        // Attach roughly half the members under an earlier member so the
        // org tree has some depth.
        let parent_id = if i % 2 == 1 {
            member_ids.get(i / 2).copied()
        } else {
            Some(admin.id)
        };

        let user = user_repo.create(CreateUserRequest {
            email,
            username,
            full_name,
            password: String::new(),
            role: UserRole::Member,
            parent_id,
        }, member_hash.clone()).await?;

        credit_repo.grant(user.id, 50, "Registration credits").await?;
        member_ids.push(user.id);
    }

    println!("  Created {} members with registration credits", args.users);

    println!("Creating announcements...");

    let announcements = [
        ("Welcome to Atrium", AnnouncementType::General, false,
         "The internal platform for announcements, documents, and credits is live."),
        ("Scheduled maintenance this weekend", AnnouncementType::Important, true,
         "The platform will be unavailable Saturday 02:00-04:00 UTC."),
        ("Q3 product brochure available", AnnouncementType::Resource, false,
         "The updated brochure can be found under sales-support documents."),
        ("Onboarding training for new members", AnnouncementType::Training, false,
         "A training session for recently joined members runs next Tuesday."),
    ];

    for (offset, (title, kind, important, content)) in announcements.iter().enumerate() {
        announcement_repo.create(Announcement {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            announcement_type: *kind,
            is_important: *important,
            publish_at: Some(Utc::now() - Duration::days(offset as i64)),
            created_by: Some(admin.id),
            created_at: Utc::now() - Duration::days(offset as i64),
            updated_at: Utc::now() - Duration::days(offset as i64),
        }).await?;
    }

    println!("  Created {} announcements", announcements.len());

    println!("Creating document categories...");

    for (order, (name, slug)) in [
        ("Brochures", "brochures"),
        ("Price Lists", "price-lists"),
        ("Training Material", "training-material"),
    ].iter().enumerate() {
        document_repo.create_category(DocumentCategory {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            sort_order: order as i64,
        }).await?;
    }

    println!("  Created 3 document categories");
    println!("Seeding complete.");

    Ok(())
}
