use crate::schema::CONFIG_SCHEMA_VERSION;

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    let body = r##"# Only override what you want to change -- missing fields use defaults.

[main_window]
# label = "main"             # exact label of the singleton main window

[bus]
# capacity = 64              # bus buffer and queue depth, 1-4096

[coordinator]
# serialize_by_label = true  # make create-or-reuse atomic per label

[parameters]
# width = "0"                # values held before the first parameter-init
# height = "0"

[logging]
# level = "INFO"             # DEBUG, INFO, WARNING, ERROR
"##;
    format!("# winbridge configuration\n# Schema version {CONFIG_SCHEMA_VERSION}\n{body}")
}
