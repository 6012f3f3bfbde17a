use crate::seed::{SeedFuture, SeedReport, Seeder};
use db::models::{class, class_student, user};
use sea_orm::{DatabaseConnection, DbErr};

struct DemoClass {
    code: &'static str,
    name: &'static str,
    faculty: &'static str,
    students: [&'static str; 3],
}

const DEMO_CLASSES: &[DemoClass] = &[
    DemoClass {
        code: "CSE101",
        name: "Discrete Mathematics",
        faculty: "F25101300124",
        students: ["25101300127", "25101300128", "25101300129"],
    },
    DemoClass {
        code: "CSE102",
        name: "Computer Basics",
        faculty: "F25101300125",
        students: ["25101300128", "25101300130", "25101300131"],
    },
    DemoClass {
        code: "CSE103",
        name: "Data Structures",
        faculty: "F25101300126",
        students: ["25101300127", "25101300129", "25101300132"],
    },
];

/// Creates the demo classes and their rosters. Needs [`super::user::UserSeeder`] first.
pub struct ClassSeeder;

impl Seeder for ClassSeeder {
    fn seed<'a>(&'a self, db: &'a DatabaseConnection) -> SeedFuture<'a> {
        Box::pin(async move {
            let mut report = SeedReport::default();
            for demo in DEMO_CLASSES {
                if class::Model::find_by_code(db, demo.code).await?.is_some() {
                    report.skipped += 1;
                    continue;
                }

                let faculty = require_user(db, demo.faculty).await?;
                let created =
                    class::Model::create(db, demo.code, demo.name, None, faculty.id).await?;
                for roll in demo.students {
                    let student = require_user(db, roll).await?;
                    class_student::Model::enroll(db, created.id, student.id).await?;
                }
                report.created += 1;
            }
            Ok(report)
        })
    }
}

async fn require_user(db: &DatabaseConnection, username: &str) -> Result<user::Model, DbErr> {
    user::Model::find_by_username(db, username)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("user {username} (run the user seeder)")))
}
