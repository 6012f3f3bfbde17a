use crate::seed::{SeedFuture, SeedReport, Seeder};
use db::models::user::{Model, Role};
use sea_orm::DatabaseConnection;

/// `(username, name, password, role)` for the demo accounts.
pub const DEMO_USERS: &[(&str, &str, &str, Role)] = &[
    ("A25101300123", "Admin User", "admin123", Role::Admin),
    ("F25101300124", "Dr. Sharma", "faculty123", Role::Faculty),
    ("F25101300125", "Dr. Kapoor", "faculty123", Role::Faculty),
    ("F25101300126", "Dr. Mehta", "faculty123", Role::Faculty),
    ("25101300127", "Aman Singh", "student123", Role::Student),
    ("25101300128", "Riya Verma", "student123", Role::Student),
    ("25101300129", "Karan Patel", "student123", Role::Student),
    ("25101300130", "Sanya Gupta", "student123", Role::Student),
    ("25101300131", "Rahul Joshi", "student123", Role::Student),
    ("25101300132", "Neha Sharma", "student123", Role::Student),
];

pub struct UserSeeder;

impl Seeder for UserSeeder {
    fn seed<'a>(&'a self, db: &'a DatabaseConnection) -> SeedFuture<'a> {
        Box::pin(async move {
            let mut report = SeedReport::default();
            for &(username, name, password, role) in DEMO_USERS {
                if Model::find_by_username(db, username).await?.is_some() {
                    report.skipped += 1;
                    continue;
                }
                Model::create(db, username, name, password, role).await?;
                report.created += 1;
            }
            Ok(report)
        })
    }
}
