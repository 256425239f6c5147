use console::Style;
use trichrome_core::pipeline::config::TrichromeConfig;
use trichrome_core::pipeline::BatchReport;

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    ok: Style,
    failed: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            ok: Style::new().green(),
            failed: Style::new().red().bold(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_run_summary(config: &TrichromeConfig, files: usize) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Trichrome"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(9)));
    println!();
    println!("  {:<14}{}", s.label.apply_to("Plates"), s.value.apply_to(files));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.batch.output_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Workers"),
        s.value.apply_to(config.batch.max_workers.min(files))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Reference"),
        s.value.apply_to(config.alignment.reference)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Search"),
        s.value.apply_to(format!(
            "\u{00b1}{} px, refine \u{00b1}{} px",
            config.alignment.search_radius, config.alignment.refine_margin
        ))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Margins"),
        s.value.apply_to(format!(
            "{:.0}% width, {:.0}% band height",
            config.split.cut_width_coeff * 100.0,
            config.split.cut_height_coeff * 100.0
        ))
    );
    println!();
}

pub fn print_batch_result(report: &BatchReport) {
    let s = Styles::new();

    println!();
    for (path, outcome) in &report.outcomes {
        match outcome {
            Ok(image) => println!(
                "  {} {}  G{} B{} R{}",
                s.ok.apply_to("\u{2713}"),
                s.path.apply_to(image.output.display()),
                image.shifts.green,
                image.shifts.blue,
                image.shifts.red
            ),
            Err(e) => println!(
                "  {} {}  {}",
                s.failed.apply_to("\u{2717}"),
                s.path.apply_to(path.display()),
                e
            ),
        }
    }
    println!();

    let counts = format!("{}/{} plates processed", report.succeeded, report.total);
    if report.failed() == 0 {
        println!("  {}", s.ok.apply_to(counts));
    } else {
        println!("  {}", s.failed.apply_to(counts));
    }
}
