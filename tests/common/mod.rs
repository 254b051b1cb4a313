use axum::{Router, routing::get};
use chrono::{NaiveDate, TimeZone, Utc};
use masthead::content::{article, issue};
use masthead::routes::list;
use masthead::user::{self, Role};
use sea_orm::{ActiveValue::Set, Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use sea_orm_migration::prelude::*;
use uuid::Uuid;

/// Send search logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Test database with the fixtures from [`seed`] loaded.
pub async fn setup_seeded_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;
    seed(&db).await?;
    Ok(db)
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .route("/issues", get(list::<issue::Model>))
        .route("/articles", get(list::<article::Model>))
        .route("/users", get(list::<user::Model>))
        .with_state(db);

    Router::new().nest("/api/v1", api)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Issues v1i1 (2019-09-01), v1i2 (2019-12-01), v2i1 (2020-03-01),
/// v3i2 (2020-06-01) and v3i3 (unpublished).
///
/// Articles:
/// - "Malice in the Palace" by Ann Smith, in v3i2, published 2020-06-01
/// - "Palace Intrigue" by Bob Jones, in v2i1, published 2020-03-01
/// - "Cafeteria Review" by Ann Smith, in v1i1, published 2019-09-01
/// - "Untitled Draft" by Cy Twombly, no issue, unpublished; body mentions 50%_off
///
/// Users: ann (contributor), bob (copyeditor), cy (editor).
pub async fn seed(db: &DatabaseConnection) -> Result<(), DbErr> {
    let issues = [
        (1, 1, 1, Some(date(2019, 9, 1))),
        (2, 1, 2, Some(date(2019, 12, 1))),
        (3, 2, 1, Some(date(2020, 3, 1))),
        (4, 3, 2, Some(date(2020, 6, 1))),
        (5, 3, 3, None),
    ];
    issue::Entity::insert_many(issues.into_iter().map(|(id, volume, number, published)| {
        issue::ActiveModel {
            id: Set(id),
            volume_num: Set(volume),
            issue_num: Set(number),
            publish_date: Set(published),
        }
    }))
    .exec(db)
    .await?;

    let articles = [
        (
            "Malice in the Palace",
            "A study in corridors",
            "Ann Smith",
            "The palace was quiet.",
            Some(4),
            Some((2020, 6, 1)),
        ),
        (
            "Palace Intrigue",
            "",
            "Bob Jones",
            "Whispers in the hallway.",
            Some(3),
            Some((2020, 3, 1)),
        ),
        (
            "Cafeteria Review",
            "Lunch, ranked",
            "Ann Smith",
            "The soup was cold.",
            Some(1),
            Some((2019, 9, 1)),
        ),
        (
            "Untitled Draft",
            "",
            "Cy Twombly",
            "Everything 50%_off this week.",
            None,
            None,
        ),
    ];
    article::Entity::insert_many(articles.into_iter().map(
        |(title, sub_title, author, body, issue_id, published)| article::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            sub_title: Set(sub_title.to_string()),
            author: Set(author.to_string()),
            body: Set(body.to_string()),
            issue_id: Set(issue_id),
            published_at: Set(published.map(|(y, m, d)| {
                Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap()
            })),
        },
    ))
    .exec(db)
    .await?;

    let users = [
        ("ann", "ann@example.com", Role::Contributor),
        ("bob", "bob@example.com", Role::Copyeditor),
        ("cy", "cy@example.com", Role::Editor),
    ];
    user::Entity::insert_many(users.into_iter().map(|(username, email, role)| {
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            role: Set(role),
        }
    }))
    .exec(db)
    .await?;

    Ok(())
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateContentTables)]
    }
}

pub struct CreateContentTables;

#[async_trait::async_trait]
impl MigrationName for CreateContentTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_content_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateContentTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Issues first: articles reference them.
        manager
            .create_table(schema.create_table_from_entity(issue::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(article::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(user::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(article::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(issue::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(user::Entity).to_owned())
            .await?;
        Ok(())
    }
}
