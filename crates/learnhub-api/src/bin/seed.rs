//! Loads a development data set: one admin, one instructor, and the sample
//! catalog. Existing courses are replaced; existing accounts are kept.

use learnhub_api::auth;
use learnhub_api::config::Config;
use learnhub_api::models::{CourseLevel, NewCourse, NewUser, Role, User, UserStatus};
use learnhub_api::store::{PgStore, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct SeedCourse {
    title: &'static str,
    description: &'static str,
    price: f64,
    category: &'static str,
    level: CourseLevel,
    duration: &'static str,
}

const COURSES: &[SeedCourse] = &[
    SeedCourse {
        title: "Web Development Bootcamp",
        description: "Learn full-stack web development with HTML, CSS, JavaScript, Node.js, and React. Build real-world projects and become a professional web developer.",
        price: 49.99,
        category: "programming",
        level: CourseLevel::Beginner,
        duration: "12 weeks",
    },
    SeedCourse {
        title: "Python for Data Science",
        description: "Master Python programming and data analysis. Learn NumPy, Pandas, Matplotlib, and machine learning basics.",
        price: 39.99,
        category: "programming",
        level: CourseLevel::Intermediate,
        duration: "10 weeks",
    },
    SeedCourse {
        title: "UI/UX Design Fundamentals",
        description: "Learn the principles of user interface and user experience design. Create beautiful and functional designs using Figma.",
        price: 29.99,
        category: "design",
        level: CourseLevel::Beginner,
        duration: "6 weeks",
    },
    SeedCourse {
        title: "Digital Marketing Masterclass",
        description: "Comprehensive course covering SEO, social media marketing, email marketing, and content strategy.",
        price: 59.99,
        category: "marketing",
        level: CourseLevel::Beginner,
        duration: "8 weeks",
    },
    SeedCourse {
        title: "Business Analytics",
        description: "Learn to analyze business data and make data-driven decisions. Master Excel, SQL, and data visualization.",
        price: 44.99,
        category: "business",
        level: CourseLevel::Intermediate,
        duration: "8 weeks",
    },
    SeedCourse {
        title: "Mobile App Development",
        description: "Build iOS and Android apps using React Native. Learn mobile app design, development, and deployment.",
        price: 54.99,
        category: "programming",
        level: CourseLevel::Intermediate,
        duration: "10 weeks",
    },
    SeedCourse {
        title: "Graphic Design Essentials",
        description: "Master Adobe Photoshop, Illustrator, and InDesign. Create professional graphics and designs.",
        price: 34.99,
        category: "design",
        level: CourseLevel::Beginner,
        duration: "6 weeks",
    },
    SeedCourse {
        title: "Social Media Marketing",
        description: "Learn to create and manage successful social media campaigns across all major platforms.",
        price: 29.99,
        category: "marketing",
        level: CourseLevel::Beginner,
        duration: "4 weeks",
    },
];

async fn ensure_user(
    store: &PgStore,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<User> {
    if let Some(user) = store.find_user_by_email(email).await? {
        tracing::info!(email, "account already present");
        return Ok(user);
    }
    let user = store
        .create_user(NewUser {
            name: name.into(),
            email: email.into(),
            password_hash: auth::hash_password(password)?,
            role,
            status: UserStatus::Active,
        })
        .await?;
    tracing::info!(email, ?role, "created account");
    Ok(user)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = PgStore::connect(&config.database_url).await?;

    ensure_user(&store, "Admin", "admin@example.com", "admin123", Role::Admin).await?;
    let instructor = ensure_user(
        &store,
        "John Doe",
        "instructor@example.com",
        "password123",
        Role::Instructor,
    )
    .await?;

    let existing = store.list_courses().await?;
    for course in &existing {
        store.delete_course(course.id).await?;
    }
    tracing::info!(count = existing.len(), "cleared existing courses");

    for seed in COURSES {
        store
            .create_course(NewCourse {
                title: seed.title.into(),
                description: seed.description.into(),
                price: seed.price,
                category: seed.category.into(),
                level: seed.level,
                duration: seed.duration.into(),
                instructor_id: instructor.id,
                content: vec![],
                prerequisites: vec![],
                learning_objectives: vec![],
            })
            .await?;
    }
    tracing::info!(count = COURSES.len(), "seeded sample courses");
    Ok(())
}
