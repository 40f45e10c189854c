//! Course listing handler.

use anyhow::{Context, Result};
use gcd_core::config::Config;
use gcd_core::workflow::{Course, catalog};

pub async fn list(config: Config, json: bool, refresh: bool) -> Result<()> {
    let client = super::client(config)?;
    let cancel = super::interruptible();

    let courses = if refresh {
        catalog::refresh(&client, &cancel).await
    } else {
        catalog::load_courses(&client, &cancel).await
    }
    .map_err(|err| super::api_error(err, "load courses"))?;

    if json {
        let out = serde_json::to_string_pretty(&courses).context("serialize courses")?;
        println!("{out}");
    } else if courses.is_empty() {
        println!("No courses found.");
    } else {
        for course in &courses {
            println!("{}", format_course(course));
        }
    }
    Ok(())
}

fn format_course(course: &Course) -> String {
    match course.section_label() {
        Some(section) => format!("{}  {}  ({section})", course.id, course.name),
        None => format!("{}  {}", course.id, course.name),
    }
}
