use colored::Colorize;
use faldummy::config::DriverConfig;
use faldummy::driver::gate::Route;
use faldummy::model::{FolderInfo, Permissions};

pub(super) fn print_success(message: &str) {
    println!("{}", message.green());
}

pub(super) fn print_exists(identifier: &str, exists: bool) {
    if exists {
        println!("{} {}", "exists".green(), identifier);
    } else {
        println!("{} {}", "missing".red(), identifier);
    }
}

pub(super) fn print_permissions(permissions: &Permissions) {
    let flag = |allowed: bool| if allowed { "yes".green() } else { "no".red() };
    println!("{:<6} {}", "read", flag(permissions.read));
    println!("{:<6} {}", "write", flag(permissions.write));
}

pub(super) fn print_folder_info(info: &FolderInfo) {
    println!("{} {}", "identifier".dimmed(), info.identifier);
    println!("{}       {}", "name".dimmed(), info.name.bold());
    println!("{}    {}", "storage".dimmed(), info.storage);
}

pub(super) fn print_items(items: &[String]) {
    if items.is_empty() {
        println!("{}", "No entries.".dimmed());
        return;
    }
    for item in items {
        if item.ends_with('/') {
            println!("{}", item.blue().bold());
        } else {
            println!("{}", item);
        }
    }
}

pub(super) fn print_route(identifier: &str, route: &Route) {
    match route {
        Route::Delegate(reason) => {
            println!("{} {} ({})", "delegate".yellow(), identifier, reason);
        }
        Route::Intercept(record) => {
            let size = match (record.width, record.height) {
                (Some(w), Some(h)) => format!("{}x{}", w, h),
                _ => "unknown size".to_string(),
            };
            println!("{} {} (image, {})", "placeholder".cyan(), identifier, size);
        }
    }
}

pub(super) fn print_config(config: &DriverConfig, keys: &[&str]) {
    let width = keys.iter().map(|k| k.len()).max().unwrap_or(0);
    for key in keys {
        if let Ok(value) = config.get(key) {
            let padded = format!("{:<width$}", key, width = width);
            println!("{} {}", padded.yellow(), value);
        }
    }
}
