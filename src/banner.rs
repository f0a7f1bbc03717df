// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    let banner = r#"
                  _ _      _
 _ __  _ __ ___  __| (_) ___| |_
| '_ \| '__/ _ \/ _` | |/ __| __|
| |_) | | |  __/ (_| | | (__| |_
| .__/|_|  \___|\__,_|_|\___|\__|
|_|

    Prediction Console
"#;
    println!("{}", banner);
}
