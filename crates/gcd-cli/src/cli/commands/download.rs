//! Export-and-download handler.
//!
//! Runs the same sequence as the interactive view: validate the selection
//! against the catalog, request the export, then retrieve the archive.

use std::path::PathBuf;

use anyhow::{Result, bail};
use gcd_core::config::Config;
use gcd_core::workflow::{
    Course, Delivered, ExportTrigger, SelectionSet, artifact, catalog, export,
};
use gcd_core::SystemBrowser;

/// Which courses to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    Ids(Vec<String>),
}

pub async fn run(config: Config, target: &Target, output_dir: Option<PathBuf>) -> Result<()> {
    let client = super::client(config)?;
    let cancel = super::interruptible();

    let courses = catalog::load_courses(&client, &cancel)
        .await
        .map_err(|err| super::api_error(err, "load courses"))?;
    let selection = select(&courses, target)?;

    let mut trigger = ExportTrigger::default();
    let request = trigger.begin(&selection)?;
    println!("Exporting {} course(s)...", request.selected_course_ids.len());
    let exported = export::request_export(&client, &request, &cancel).await;
    trigger.settle();
    exported.map_err(|err| super::api_error(err, "export courses"))?;

    let action = artifact::retrieve(&client).map_err(|err| super::api_error(err, "retrieve"))?;
    let directory = output_dir.unwrap_or_else(|| client.config().download.directory());
    let delivered = artifact::deliver(
        &client,
        &action,
        client.config().download.mode,
        &SystemBrowser,
        &directory,
        &cancel,
    )
    .await
    .map_err(|err| super::api_error(err, "download archive"))?;

    match delivered {
        Delivered::Saved { path, bytes } => {
            println!("Saved {} ({bytes} bytes)", path.display());
        }
        Delivered::HandedToBrowser { url } => {
            println!("Opened {url} in the browser.");
        }
    }
    Ok(())
}

/// Builds the selection, rejecting ids the catalog does not list.
fn select(courses: &[Course], target: &Target) -> Result<SelectionSet> {
    let selection: SelectionSet = match target {
        Target::All => courses.iter().map(|course| course.id.as_str()).collect(),
        Target::Ids(ids) => {
            let unknown: Vec<&str> = ids
                .iter()
                .map(String::as_str)
                .filter(|id| !courses.iter().any(|course| course.id == *id))
                .collect();
            if !unknown.is_empty() {
                bail!("Unknown course id(s): {}", unknown.join(", "));
            }
            ids.iter().collect()
        }
    };

    if selection.is_empty() {
        bail!("No courses to export.");
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courses() -> Vec<Course> {
        vec![
            Course::new("a", "Math"),
            Course::new("b", "Art"),
            Course::new("c", "CS"),
        ]
    }

    #[test]
    fn test_select_keeps_given_order() {
        let target = Target::Ids(vec!["c".to_string(), "a".to_string()]);
        let selection = select(&courses(), &target).unwrap();
        assert_eq!(selection.ids(), ["c", "a"]);
    }

    #[test]
    fn test_select_deduplicates_ids() {
        let target = Target::Ids(vec!["a".to_string(), "a".to_string()]);
        let selection = select(&courses(), &target).unwrap();
        assert_eq!(selection.ids(), ["a"]);
    }

    #[test]
    fn test_select_rejects_unknown_ids() {
        let target = Target::Ids(vec!["a".to_string(), "zz".to_string()]);
        let err = select(&courses(), &target).unwrap_err();
        assert!(err.to_string().contains("zz"));
    }

    #[test]
    fn test_select_all_of_empty_catalog_fails() {
        let err = select(&[], &Target::All).unwrap_err();
        assert!(err.to_string().contains("No courses"));
    }
}
