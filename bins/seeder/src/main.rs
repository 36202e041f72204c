//! Demo data seeder for Reimburse development.
//!
//! Creates a company with an admin, a manager, a finance approver and two
//! employees, one two-step approval flow and one percentage rule, then prints
//! a bearer token for every seeded user. Each run seeds a fresh company.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use reimburse_core::approval::validation::{FlowInput, RuleInput, StepInput};
use reimburse_core::approval::{RuleType, User, UserRole};
use reimburse_db::repositories::{CreateCompanyInput, CreateUserInput};
use reimburse_db::{
    ApprovalFlowRepository, ApprovalRuleRepository, CompanyRepository, UserRepository,
};
use reimburse_shared::types::{CurrencyCode, UserId};
use reimburse_shared::{AppConfig, JwtConfig, JwtService};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = reimburse_db::connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding company...");
    let company = CompanyRepository::new(db.clone())
        .create(CreateCompanyInput {
            name: "Acme Travel Co".to_string(),
            currency: CurrencyCode::USD,
            country: "United States".to_string(),
        })
        .await?;
    let company_id = company.id.into_inner();

    println!("Seeding users...");
    let users = seed_users(&db, company_id).await?;

    println!("Seeding approval policies...");
    seed_policies(&db, company_id, &users).await?;

    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    });

    println!("Seeding complete! Company {company_id}");
    for user in [&users.admin, &users.manager, &users.finance, &users.alice, &users.bob] {
        let token = jwt.generate_access_token(
            user.id.into_inner(),
            company_id,
            user.role.as_str(),
        )?;
        println!("  {:<9} {:<28} {token}", user.role.as_str(), user.email);
    }

    Ok(())
}

struct SeededUsers {
    admin: User,
    manager: User,
    finance: User,
    alice: User,
    bob: User,
}

async fn seed_users(db: &DatabaseConnection, company_id: Uuid) -> anyhow::Result<SeededUsers> {
    let repo = UserRepository::new(db.clone());
    let create = |name: &str, email: &str, role, manager_id: Option<UserId>, flag| CreateUserInput {
        name: name.to_string(),
        email: email.to_string(),
        role,
        manager_id,
        is_manager_approver: flag,
    };

    let admin = repo
        .create(company_id, create("Ada Admin", "admin@acme.test", UserRole::Admin, None, false))
        .await?;
    let manager = repo
        .create(
            company_id,
            create("Mona Manager", "manager@acme.test", UserRole::Manager, None, true),
        )
        .await?;
    let finance = repo
        .create(
            company_id,
            create("Fin Ance", "finance@acme.test", UserRole::Manager, None, false),
        )
        .await?;
    let alice = repo
        .create(
            company_id,
            create("Alice Employee", "alice@acme.test", UserRole::Employee, Some(manager.id), false),
        )
        .await?;
    let bob = repo
        .create(
            company_id,
            create("Bob Employee", "bob@acme.test", UserRole::Employee, Some(manager.id), false),
        )
        .await?;

    Ok(SeededUsers {
        admin,
        manager,
        finance,
        alice,
        bob,
    })
}

async fn seed_policies(
    db: &DatabaseConnection,
    company_id: Uuid,
    users: &SeededUsers,
) -> anyhow::Result<()> {
    let flow = ApprovalFlowRepository::new(db.clone())
        .create(
            company_id,
            &FlowInput {
                name: "Large expenses".to_string(),
                steps: vec![
                    StepInput {
                        name: "Manager review".to_string(),
                        approver_id: users.manager.id,
                    },
                    StepInput {
                        name: "Finance review".to_string(),
                        approver_id: users.finance.id,
                    },
                    StepInput {
                        name: "Director sign-off".to_string(),
                        approver_id: users.admin.id,
                    },
                ],
                min_amount: Some(Decimal::from(1000)),
                max_amount: None,
                is_active: Some(true),
            },
        )
        .await?;

    ApprovalRuleRepository::new(db.clone())
        .create(
            company_id,
            &RuleInput {
                name: "Two of three for large expenses".to_string(),
                rule_type: RuleType::Percentage,
                approval_percentage: Some(60),
                specific_approver_id: None,
                min_amount: Some(Decimal::from(1000)),
                max_amount: None,
                is_active: Some(true),
                approval_flow_id: Some(flow.id),
            },
        )
        .await?;

    Ok(())
}
