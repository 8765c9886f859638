pub fn log_platform_guidance() {
    #[cfg(windows)]
    const TEMPLATE: &str = r#"[Service]
ExecStart=banwatch.exe --config C:\etc\banwatch\banwatch.toml
Restart=always
"#;

    #[cfg(not(windows))]
    const TEMPLATE: &str = r#"[Unit]
Description=Staff ban watch service
After=network-online.target
Wants=network-online.target

[Service]
ExecStart=/usr/local/bin/banwatch --config /etc/banwatch/banwatch.toml
Restart=on-failure

[Install]
WantedBy=multi-user.target
"#;

    tracing::info!(
        template = TEMPLATE,
        "platform-specific service descriptor available"
    );
}
