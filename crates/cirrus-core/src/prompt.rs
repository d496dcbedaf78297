//! System prompt and user-facing startup text.

/// Hint shown when no completion API key is configured.
pub const API_KEY_HINT: &str =
    "Set OPENAI_API_KEY in the environment or in the [openai] section of the config file.";

/// Build the default system prompt for the configured backends.
pub fn default_system_prompt(
    has_drive: bool,
    has_onedrive: bool,
    drive_folder_id: Option<&str>,
) -> String {
    let mut parts = vec!["You are Cirrus, a helpful AI assistant.".to_string()];
    let has_storage = has_drive || has_onedrive;

    if has_storage {
        parts.push(
            "You have tools to browse and read files from the user's cloud storage. When the user asks about their files or data, USE YOUR TOOLS to look up the actual content. Do not guess or make things up from file names alone."
                .to_string(),
        );
    }

    if has_drive {
        match drive_folder_id {
            Some(folder) => parts.push(format!(
                "For Google Drive: The root folder ID is {folder}. When listing files, start with that root folder ID."
            )),
            None => parts.push(
                "For Google Drive: Use list_drive_files with no folder_id to see all accessible files, or use search_drive_files to find files by name."
                    .to_string(),
            ),
        }
        parts.push(
            "For Google Docs/Sheets/Slides, use export mode. For PDF and DOCX files, use read_drive_file for extracted text."
                .to_string(),
        );
    }

    if has_onedrive {
        parts.push(
            "For Microsoft OneDrive/SharePoint: Use list_onedrive_files to browse files, search_onedrive_files to find files by name, and read_onedrive_file to read content. If a result includes driveId, pass it as drive_id in follow-up calls."
                .to_string(),
        );
        parts.push(
            "If no default OneDrive context is configured, start with list_onedrive_files (without folder_id) to discover accessible drives/sites."
                .to_string(),
        );
    }

    if has_storage {
        parts.push(
            "When you cite a file, include its full URL so the user can open it directly. If you quote or summarize specific file content, mention the exact source file name and link."
                .to_string(),
        );
    }

    parts.push("Be concise and helpful. Summarize data clearly.".to_string());
    parts.join(" ")
}

/// Greeting for a fresh chat.
pub fn welcome_message(has_drive: bool, has_onedrive: bool) -> String {
    let sources: Vec<&str> = [(has_drive, "Google Drive"), (has_onedrive, "OneDrive")]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();

    if sources.is_empty() {
        "Welcome to Cirrus. Cloud storage access is not configured yet.".to_string()
    } else {
        format!(
            "Welcome to Cirrus. I can browse and read your {} files. Ask me anything!",
            sources.join(" and ")
        )
    }
}
