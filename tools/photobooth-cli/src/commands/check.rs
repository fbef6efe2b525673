//! Report platform capabilities.

use photobooth_platform::{HostEnvironment, PlatformCapabilities};

pub fn run(user_agent: Option<String>, url: String) -> anyhow::Result<()> {
    let ua = user_agent.unwrap_or_else(|| HostEnvironment::local().user_agent);
    let env = HostEnvironment::from_url(ua, &url);
    let caps = PlatformCapabilities::detect(&env);

    println!("Photobooth Platform Check");
    println!("{}", "=".repeat(50));
    println!("Browser: {}", caps.browser.label());
    println!("Platform class: {:?}", caps.class);
    println!("Camera negotiation: {:?}", caps.negotiation());
    println!("Export strategy: {:?}", caps.export_strategy());
    println!();

    for cap in caps.report() {
        let status = match (cap.available, cap.required) {
            (true, _) => "[OK]  ",
            (false, true) => "[FAIL]",
            (false, false) => "[WARN]",
        };
        println!("{status} {}: {}", cap.name, cap.description);
        if let Some(fix) = &cap.fix_instructions {
            println!("       -> {fix}");
        }
    }
    println!();

    if caps.is_compatible() {
        println!("This platform can run the booth.");
    } else {
        println!("This platform cannot run the booth; see the failures above.");
    }
    Ok(())
}
