use std::{env, fs};

use anyhow::{anyhow, Context, Result};
use studybase::courses::CourseManager;
use studybase::import::import_workbook;
use studybase::store::{BlobStore, FileBlobStore};
use uuid::Uuid;

fn main() -> Result<()> {
    let args = CliArgs::parse()?;
    let manager = CourseManager::new()?;

    let course_id = match (args.course, args.create.as_deref()) {
        (Some(id), None) => {
            manager.get_course(id)?;
            id
        }
        (None, Some(title)) => {
            let description = args
                .description
                .as_deref()
                .context("--create requires --description")?;
            let course = manager.create_course(title, description)?;
            println!("Created course '{}' ({})", course.title, course.course_id);
            course.course_id
        }
        _ => {
            return Err(anyhow!(
                "Pass exactly one of --course <uuid> or --create <title>. Run with --help for usage."
            ));
        }
    };

    let bytes = fs::read(&args.file)
        .with_context(|| format!("Could not read workbook '{}'", args.file))?;
    let log = manager.activity_log(course_id);
    let media_store = FileBlobStore::new(&manager.paths.media_dir);
    let blob: Option<&dyn BlobStore> = if args.upload_images {
        Some(&media_store)
    } else {
        None
    };
    let mut settings = manager.config.import.clone();
    if args.upload_images {
        settings.inline_images = false;
    }

    let outcome = import_workbook(&manager, &log, course_id, &bytes, blob, &settings)?;
    println!(
        "Imported {} of {} rows ({} skipped).",
        outcome.summary.imported, outcome.summary.total_rows, outcome.summary.skipped
    );
    for issue in &outcome.summary.issues {
        println!("  row {}: {}", issue.row, issue.message);
    }

    Ok(())
}

struct CliArgs {
    file: String,
    course: Option<Uuid>,
    create: Option<String>,
    description: Option<String>,
    upload_images: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut file = None;
        let mut course = None;
        let mut create = None;
        let mut description = None;
        let mut upload_images = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" => {
                    let value = args.next().context("Expected a path after --file")?;
                    file = Some(value);
                }
                "--course" => {
                    let value = args.next().context("Expected a course id after --course")?;
                    course = Some(
                        Uuid::parse_str(&value)
                            .with_context(|| format!("'{value}' is not a valid course id"))?,
                    );
                }
                "--create" => {
                    let value = args.next().context("Expected a title after --create")?;
                    create = Some(value);
                }
                "--description" => {
                    let value = args
                        .next()
                        .context("Expected a description after --description")?;
                    description = Some(value);
                }
                "--upload-images" => upload_images = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument '{other}'. Run with --help for usage instructions."
                    ));
                }
            }
        }
        let file = file.context("Missing required argument --file <path>")?;
        Ok(Self {
            file,
            course,
            create,
            description,
            upload_images,
        })
    }
}

fn print_usage() {
    println!("Studybase workbook import");
    println!("Loads a question spreadsheet into a course.");
    println!();
    println!("Usage:");
    println!("  import_workbook --file <path> --course <uuid>");
    println!("  import_workbook --file <path> --create <title> --description <text>");
    println!();
    println!("Options:");
    println!("  --file <path>          Workbook to import (.xlsx)");
    println!("  --course <uuid>        Import into an existing course");
    println!("  --create <title>       Create a new course first");
    println!("  --description <text>   Description for the created course");
    println!("  --upload-images        Store row images in media/ instead of inlining");
}
