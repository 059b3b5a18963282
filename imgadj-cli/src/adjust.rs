use crate::Cli;
use crate::output::{print_change, print_info, print_progress, print_success, print_warning};
use imgadj_adjust::{AdjustRequest, RunSummary, run};
use imgadj_core::{Config, Result, RunJournal, parse_interface_option, split_list};
use imgadj_guest::{GuestfishSession, close_image, open_image, print_inventory};
use tracing::debug;

pub(crate) fn request_from(cli: &Cli) -> Result<AdjustRequest> {
    let interfaces = cli
        .interface
        .as_deref()
        .map(parse_interface_option)
        .transpose()?;

    Ok(AdjustRequest {
        image: cli.image.clone(),
        xml: cli.xml.clone(),
        interfaces,
        primary: cli.primary.clone(),
        gateway: cli.gateway.clone(),
        nameservers: split_list(cli.nameserver.as_deref()),
        domains: split_list(cli.domain.as_deref()),
        hostname: cli.hostname.clone(),
        serial_console: cli.serial_console,
    })
}

pub fn execute(cli: Cli, config: Config) -> Result<()> {
    // Interface descriptions are checked before the image is opened.
    let request = request_from(&cli)?;
    if let Some(specs) = &request.interfaces {
        debug!("interfaces: {}", specs.to_option_string());
    }

    let journal = RunJournal::new(&request.image)?;
    journal.init()?;
    journal.info(&format!(
        "Adjusting {} with {}",
        request.image.display(),
        request.xml.display()
    ))?;

    print_progress(&format!("Opening image {}", request.image.display()));
    let mut guest = GuestfishSession::launch(&config.guestfish, &request.image, true)?;
    let os = open_image(&mut guest).inspect_err(|e| {
        let _ = journal.error(&e.to_string());
    })?;
    journal.info(&format!("Guest OS: {}", os.tag()))?;
    if cli.debug {
        print_inventory(&mut guest)?;
    }

    let summary = match run(&mut guest, &os, &request, &config, &journal) {
        Ok(summary) => summary,
        Err(e) => {
            journal.error(&e.to_string())?;
            return Err(e);
        }
    };

    close_image(&mut guest)?;
    report(&summary);

    print_success(&format!("Adjusted {}", request.image.display()));
    print_info(&format!("Run log: {}", journal.path().display()));
    Ok(())
}

/// Prints the outcome; the journal already holds every line of it.
fn report(summary: &RunSummary) {
    if let Some(sync) = &summary.descriptor {
        print_progress("Domain XML updated");
        for line in &sync.lines {
            print_change(line);
        }
        print_info(&format!("Original XML kept as {}", sync.backup.display()));
    }
    for operation in &summary.skipped {
        print_info(&format!("{operation} not defined for {}, skipped", summary.family));
    }
    for warning in &summary.warnings {
        print_warning(warning);
    }
}
