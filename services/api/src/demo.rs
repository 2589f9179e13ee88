use crate::infra::InMemorySnapshotStore;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Args;
use cougar_cash::config::{AppConfig, RewardsConfig};
use cougar_cash::error::AppError;
use cougar_cash::school::{
    AdjustmentMode, HallPassKind, JsonFileStore, SchoolService, SnapshotStore,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CalendarArgs {
    /// First date to print (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: NaiveDate,
    /// Last date to print, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end: NaiveDate,
    /// Snapshot file to read overrides from (defaults to APP_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct RedeemArgs {
    /// Purchase code, order id, pass id, or merchant barcode
    pub(crate) code: String,
    /// Snapshot file to scan against (defaults to APP_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct BudgetArgs {
    /// Admin id, e.g. adm-main
    #[arg(long)]
    pub(crate) admin: String,
    /// Snapshot file to read (defaults to APP_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// School day to simulate (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn open_saved_school(
    snapshot: Option<PathBuf>,
) -> Result<SchoolService<JsonFileStore>, AppError> {
    let config = AppConfig::load()?;
    let path = snapshot.unwrap_or(config.storage.snapshot_path);
    let school = SchoolService::open(
        Arc::new(JsonFileStore::new(path)),
        config.rewards,
        Local::now().naive_local(),
    )?;
    Ok(school)
}

pub(crate) fn run_calendar(args: CalendarArgs) -> Result<(), AppError> {
    let CalendarArgs {
        start,
        end,
        snapshot,
    } = args;

    let school = open_saved_school(snapshot)?;
    print_calendar(&school, start, end)
}

pub(crate) fn run_redeem(args: RedeemArgs) -> Result<(), AppError> {
    let school = open_saved_school(args.snapshot)?;
    let report = school.scan(&args.code, Local::now().naive_local())?;
    let marker = if report.result.success { "OK" } else { "REJECTED" };
    println!("[{marker}] {}", report.result.message);
    if let Some(target) = &report.redemption.target {
        println!("  holder {} | record {}", target.holder_id, target.purchase_id);
    }
    Ok(())
}

pub(crate) fn run_budget(args: BudgetArgs) -> Result<(), AppError> {
    let school = open_saved_school(args.snapshot)?;
    let view = school.budget(&args.admin, Local::now().naive_local())?;
    println!(
        "{} | {} | used {} of {} points | {} remaining",
        view.admin_id,
        view.month,
        view.used_points,
        view.monthly_award_limit,
        view.remaining_display
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = match args.today {
        Some(date) => school_morning(date),
        None => Local::now().naive_local(),
    };
    let today = now.date();

    println!("Cougar Cash demo for {}", today.format("%A %Y-%m-%d"));
    let school = SchoolService::open(
        Arc::new(InMemorySnapshotStore::default()),
        RewardsConfig::default(),
        now,
    )?;
    let admin = school.login_admin("admin")?;

    let ava = school.add_student("Ava Cougar", "ava.cougar@school.example", now)?;
    let ben = school.add_student("Ben Prowl", "ben.prowl@school.example", now)?;
    println!("\nRoster");
    for student in [&ava, &ben] {
        println!("- {} (login code {})", student.name, student.login_code);
    }

    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    println!("\nThis week's calendar");
    print_calendar(&school, monday, monday + Duration::days(6))?;

    println!("\nAttendance");
    let summary = school.mark_attendance(&admin.id, today, &[ava.id.clone()], now)?;
    println!(
        "- {}: {} present, {} absent, {} already recorded ({} pts each, {})",
        summary.date,
        summary.present,
        summary.absent,
        summary.skipped,
        summary.points_per_student,
        summary.reason
    );

    println!("\nAwards");
    report_step(school.award(&admin.id, &ava.id, 120, Some("Science fair"), now));
    report_step(school.award(&admin.id, &ben.id, 5_000, Some("Everything"), now));
    report_step(school.adjust(
        &admin.id,
        &ben.id,
        AdjustmentMode::Add,
        60,
        "Library volunteer",
        now,
    ));
    let budget = school.budget(&admin.id, now)?;
    println!(
        "- budget: used {} of {} points, {} remaining",
        budget.used_points, budget.monthly_award_limit, budget.remaining_display
    );

    println!("\nStore and scanner");
    let pizza = school.buy_now(&ava.id, "3", now)?;
    println!("- Ava bought a pizza voucher for {} pts", pizza.total_cost);
    for code in &pizza.codes {
        scan_and_print(&school, code.as_str(), now)?;
        scan_and_print(&school, code.as_str(), now)?;
    }

    let lunch = school.buy_now(&ava.id, "2", now)?;
    for code in &lunch.codes {
        scan_and_print(&school, code.as_str(), now)?;
        scan_and_print(&school, code.as_str(), now + Duration::days(3))?;
    }

    let hoodie = school.buy_now(&ben.id, "1", now)?;
    for order in school.pending_orders() {
        println!(
            "- pending order {} for {}: {}",
            order.order.id, order.student_name, order.order.item_name
        );
    }
    for code in &hoodie.codes {
        report_step(school.mark_order_ready(&admin.id, &ben.id, code, now));
        scan_and_print(&school, code.as_str(), now + Duration::hours(6))?;
    }

    println!("\nHall passes");
    let pass = school.request_hall_pass(&ava.id, HallPassKind::Library, now)?;
    println!("- {} left for the {}", pass.student_name, pass.kind.label());
    scan_and_print(&school, &pass.id, now + Duration::minutes(12))?;

    let ava = school.student(&ava.id)?;
    println!(
        "\nAva ends the day with {} pts and {} unread notifications",
        ava.total_points,
        ava.unread_notifications()
    );

    Ok(())
}

fn school_morning(date: NaiveDate) -> NaiveDateTime {
    let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(eight)
}

fn print_calendar<S>(
    school: &SchoolService<S>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), AppError>
where
    S: SnapshotStore + 'static,
{
    let days = school.calendar_range(start, end)?;
    if days.is_empty() {
        println!("No days between {start} and {end}.");
        return Ok(());
    }
    for day in days {
        println!(
            "- {} | {:>2} pts | {} ({})",
            day.date.format("%a %Y-%m-%d"),
            day.points.points,
            day.points.reason,
            day.points.classification.label()
        );
    }
    Ok(())
}

fn scan_and_print<S>(
    school: &SchoolService<S>,
    code: &str,
    at: NaiveDateTime,
) -> Result<(), AppError>
where
    S: SnapshotStore + 'static,
{
    let report = school.scan(code, at)?;
    println!("- scan {code}: {}", report.result.message);
    Ok(())
}

fn report_step<E: std::fmt::Display>(result: Result<String, E>) {
    match result {
        Ok(message) => println!("- {message}"),
        Err(err) => println!("- rejected: {err}"),
    }
}
