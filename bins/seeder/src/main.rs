//! Database seeder for Novafin development and testing.
//!
//! Seeds an admin account, public pages, and FAQ entries for local
//! development.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use novafin_core::auth::hash_password;
use novafin_db::entities::{content_pages, faq_items, users};

/// Admin user ID (consistent for all seeds)
const ADMIN_USER_ID: &str = "00000000-0000-0000-0000-000000000001";

const ADMIN_EMAIL: &str = "admin@novafin.dev";
const ADMIN_PASSWORD: &str = "admin-dev-password";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = novafin_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding admin user...");
    seed_admin_user(&db).await;

    println!("Seeding content pages...");
    seed_content_pages(&db).await;

    println!("Seeding FAQ entries...");
    seed_faq(&db).await;

    println!("Seeding complete!");
}

fn admin_user_id() -> Uuid {
    Uuid::parse_str(ADMIN_USER_ID).unwrap()
}

/// Seeds the admin account used for reviews in local development.
async fn seed_admin_user(db: &DatabaseConnection) {
    if users::Entity::find_by_id(admin_user_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Admin user already exists, skipping...");
        return;
    }

    let password_hash = hash_password(ADMIN_PASSWORD).expect("Failed to hash admin password");
    let now = Utc::now();
    let admin = users::ActiveModel {
        id: Set(admin_user_id()),
        email: Set(ADMIN_EMAIL.to_string()),
        password_hash: Set(password_hash),
        first_name: Set("Admin".to_string()),
        last_name: Set("User".to_string()),
        role: Set("admin".to_string()),
        client_id: Set("NF-ADMIN".to_string()),
        account_number: Set("0000000000".to_string()),
        mfa_enabled: Set(false),
        mfa_secret: Set(None),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    if let Err(e) = admin.insert(db).await {
        eprintln!("Failed to insert admin user: {e}");
    } else {
        println!("  Created admin user: {ADMIN_EMAIL}");
    }
}

/// Seeds the public informational pages.
async fn seed_content_pages(db: &DatabaseConnection) {
    let pages = [
        (
            "about",
            "About Novafin",
            "Novafin provides transparent fixed-fee financing for individuals \
             and small businesses. Apply online, sign digitally, and repay in \
             equal monthly installments.",
        ),
        (
            "terms",
            "Terms of Service",
            "These terms govern your use of the Novafin platform, including \
             financing applications, fees, electronic signatures, and \
             repayment obligations.",
        ),
        (
            "privacy",
            "Privacy Policy",
            "How Novafin collects, uses, and protects the personal and \
             financial information you provide during onboarding and while \
             using the platform.",
        ),
        (
            "how-it-works",
            "How It Works",
            "Verify your identity, request a quote, pay the one-time fee, \
             sign your contract electronically, and receive your financing \
             after review.",
        ),
    ];

    let now = Utc::now();
    for (slug, title, content) in pages {
        let exists = content_pages::Entity::find()
            .filter(content_pages::Column::Slug.eq(slug))
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some();
        if exists {
            println!("  Page '{slug}' already exists, skipping...");
            continue;
        }

        let page = content_pages::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(slug.to_string()),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            meta_description: Set(None),
            is_published: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        if let Err(e) = page.insert(db).await {
            eprintln!("Failed to insert page '{slug}': {e}");
        } else {
            println!("  Created page: {slug}");
        }
    }
}

/// Seeds the FAQ entries.
async fn seed_faq(db: &DatabaseConnection) {
    let items = [
        (
            "general",
            1,
            "What is Novafin?",
            "A financing platform with a single fixed fee instead of interest. \
             You repay the principal in equal monthly installments.",
        ),
        (
            "general",
            2,
            "How is the fee calculated?",
            "The one-time fee is a percentage of the financed amount, shown in \
             full before you submit your application.",
        ),
        (
            "payments",
            1,
            "Which payment methods are supported?",
            "Card payments through hosted checkout and cryptocurrency payments \
             through a pay-to-address quote.",
        ),
        (
            "payments",
            2,
            "When are installments due?",
            "Monthly, starting one month after your financing is activated. \
             Reminders are sent before each due date.",
        ),
        (
            "verification",
            1,
            "What documents do I need for identity verification?",
            "A government-issued ID and a proof of address. Additional \
             documents can be requested during review.",
        ),
    ];

    let now = Utc::now();
    for (category, sort_order, question, answer) in items {
        let exists = faq_items::Entity::find()
            .filter(faq_items::Column::Question.eq(question))
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some();
        if exists {
            println!("  FAQ '{question}' already exists, skipping...");
            continue;
        }

        let item = faq_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            question: Set(question.to_string()),
            answer: Set(answer.to_string()),
            category: Set(category.to_string()),
            sort_order: Set(sort_order),
            is_published: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        if let Err(e) = item.insert(db).await {
            eprintln!("Failed to insert FAQ entry: {e}");
        } else {
            println!("  Created FAQ entry: {question}");
        }
    }
}
