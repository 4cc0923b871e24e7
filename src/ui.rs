// UI layer: collects the three inputs with `dialoguer` prompts (unless they
// were passed on the command line), runs the upload workflow behind an
// `indicatif` spinner and prints the final summary.

use crate::api::{http_client, CatApiClient, DiskClient};
use crate::config::Cli;
use crate::workflow::{required, Progress, UploadReport, UploadRequest, UploadWorkflow};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Run one upload. Returns `Ok(false)` when the run failed in an expected
/// way (empty input, remote error) and the message was already printed.
pub fn run(cli: &Cli) -> Result<bool> {
    println!("{}", "Cat pictures to Yandex.Disk".bold());
    println!("{}", "=".repeat(40));

    let Some(request) = collect_request(cli)? else {
        return Ok(false);
    };

    let client = http_client(cli.timeout())?;
    let images = CatApiClient::new(client.clone(), cli.image_host.clone());
    let storage = DiskClient::new(client, cli.disk_api.clone());

    println!("\nProcessing text: '{}'", request.caption());

    // The spinner keeps turning while a request is in flight; finished
    // steps go to stdout with the spinner suspended, so they still show up
    // when stderr is not a terminal and the spinner is hidden.
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("Working...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let pb = spinner.clone();
    let workflow = UploadWorkflow::new(images, storage).on_progress(move |event| {
        let line = match event {
            Progress::MetadataSkipped { .. } => format!("! {event}").yellow().to_string(),
            _ => format!("✔ {event}"),
        };
        pb.suspend(|| println!("{line}"));
    });

    let result = workflow.run(&request);
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            for line in summary_lines(&report) {
                println!("{line}");
            }
            println!("\n{}", "Finished successfully".green());
            Ok(true)
        }
        Err(err) => {
            println!("{}", format!("✘ {err}").red());
            println!("\n{}", "Finished with errors".red());
            Ok(false)
        }
    }
}

/// Ask for caption, folder and token in that order. The first blank answer
/// ends the collection with a message and `None`.
fn collect_request(cli: &Cli) -> Result<Option<UploadRequest>> {
    let caption = ask(cli.caption.as_deref(), "Text for the cat", false)?;
    let Some(caption) = checked("Caption", &caption) else {
        return Ok(None);
    };

    let folder = ask(cli.folder.as_deref(), "Folder name on Yandex.Disk", false)?;
    let Some(folder) = checked("Folder name", &folder) else {
        return Ok(None);
    };

    // `Password` hides the token while it is typed.
    let token = ask(cli.token.as_deref(), "Yandex.Disk token", true)?;
    let Some(token) = checked("Token", &token) else {
        return Ok(None);
    };

    Ok(Some(UploadRequest::new(&caption, &folder, &token)?))
}

/// Use the preset value if there is one, prompt otherwise. Empty answers
/// are allowed here so the caller can report them.
fn ask(preset: Option<&str>, prompt: &str, secret: bool) -> Result<String> {
    if let Some(value) = preset {
        return Ok(value.to_string());
    }
    let value = if secret {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?
    } else {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?
    };
    Ok(value)
}

fn checked(field: &'static str, value: &str) -> Option<String> {
    match required(field, value) {
        Ok(value) => Some(value),
        Err(err) => {
            println!("{}", err.to_string().red());
            None
        }
    }
}

const METADATA_WARNING: &str = "Warning: the info file was not uploaded, but the image is saved";

/// Lines printed after a successful run.
pub fn summary_lines(report: &UploadReport) -> Vec<String> {
    let mut lines = vec![
        format!("\n{}", "Done!".green().bold()),
        format!("Folder: {}/", report.folder),
        format!("Image: {}", report.image_path),
        format!("Info: {}", report.metadata_path),
    ];
    if !report.metadata_uploaded {
        lines.push(METADATA_WARNING.yellow().to_string());
    }
    lines
}
