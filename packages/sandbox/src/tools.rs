// ABOUTME: Caller-facing execution presets for the supported security tools
// ABOUTME: Encodes per-tool images, argument lists, and resource ceilings; not enforced by the engine

use crate::types::ToolConfig;

/// Subdomain discovery with Subfinder.
pub fn subfinder_config(domain: &str, output_file: &str) -> ToolConfig {
    ToolConfig::builder("subfinder", "subfinder")
        .image("projectdiscovery/subfinder:latest")
        .args(["-d", domain, "-o", output_file, "-silent"])
        .timeout(1800)
        .cpu_limit(1.0)
        .memory_limit(1024)
        .build()
}

/// HTTP probing with HTTPx over a list of hosts.
pub fn httpx_config(input_file: &str, output_file: &str) -> ToolConfig {
    ToolConfig::builder("httpx", "httpx")
        .image("projectdiscovery/httpx:latest")
        .args([
            "-l",
            input_file,
            "-o",
            output_file,
            "-json",
            "-silent",
            "-tech-detect",
            "-status-code",
        ])
        .timeout(1800)
        .cpu_limit(2.0)
        .memory_limit(2048)
        .build()
}

/// Port and service scanning with Nmap, XML output.
pub fn nmap_config(target: &str, output_file: &str) -> ToolConfig {
    ToolConfig::builder("nmap", "nmap")
        .image("instrumentisto/nmap:latest")
        .args([
            "-sV",
            "-sC",
            "-T4",
            "-oX",
            output_file,
            "--max-retries",
            "2",
            "--host-timeout",
            "30m",
            target,
        ])
        .timeout(3600)
        .cpu_limit(2.0)
        .memory_limit(2048)
        .build()
}

/// Template-driven vulnerability scanning with Nuclei.
///
/// Templates can be memory-intensive, hence the larger ceiling.
pub fn nuclei_config(target_file: &str, output_file: &str) -> ToolConfig {
    ToolConfig::builder("nuclei", "nuclei")
        .image("projectdiscovery/nuclei:latest")
        .args([
            "-l",
            target_file,
            "-o",
            output_file,
            "-json",
            "-silent",
            "-severity",
            "critical,high,medium",
        ])
        .timeout(3600)
        .cpu_limit(2.0)
        .memory_limit(4096)
        .build()
}

/// SQL injection testing with SQLMap. Needs live network access, so this is
/// the one preset that is not network-isolated.
pub fn sqlmap_config(target_url: &str, output_dir: &str) -> ToolConfig {
    ToolConfig::builder("sqlmap", "sqlmap")
        .image("pberba/sqlmap:latest")
        .args([
            "-u",
            target_url,
            "--batch",
            "--random-agent",
            "--output-dir",
            output_dir,
            "--dump",
            "--threads",
            "5",
        ])
        .timeout(3600)
        .cpu_limit(2.0)
        .memory_limit(2048)
        .network_isolated(false)
        .build()
}
