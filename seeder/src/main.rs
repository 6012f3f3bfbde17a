use crate::seed::{Seeder, run_seeder};
use crate::seeds::{class::ClassSeeder, user::UserSeeder};
use std::env;

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let Ok(db_path) = env::var("DATABASE_PATH") else {
        eprintln!("DATABASE_PATH must be set");
        std::process::exit(1);
    };
    let db = match db::connect(&db_path).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to connect to {db_path}: {e}");
            std::process::exit(1);
        }
    };

    for (seeder, name) in [
        (Box::new(UserSeeder) as Box<dyn Seeder + Send + Sync>, "User"),
        (Box::new(ClassSeeder), "Class"),
    ] {
        run_seeder(&*seeder, name, &db).await;
    }
}
