//! Hand corrections applied to the vendor catalog, plus actions the vendor
//! data predates (Run Shell Script and Ask LLM, both added in macOS Tahoe).

use serde_json::json;

use crate::error::CatalogError;
use crate::spec::{ActionSpec, BlockInfo, Catalog};

pub const DOCUMENT_PICKER_OPEN: &str = "is.workflow.actions.documentpicker.open";
pub const EVERNOTE_APPEND: &str = "is.workflow.actions.evernote.append";
pub const POST_ON_FACEBOOK: &str = "is.workflow.actions.postonfacebook";
pub const RUN_SHELL_SCRIPT: &str = "is.workflow.actions.runshellscript";
pub const ASK_LLM: &str = "is.workflow.actions.askllm";

/// Index of the document picker parameter that must not be offered to users.
const DOCUMENT_PICKER_HIDDEN_PARAM: usize = 4;

/// Block actions and their (example, completion) snippets.
const BLOCK_INFO: &[(&str, &str, &str)] = &[
    (
        "is.workflow.actions.conditional",
        "\n  ...\notherwise\n  ...\nend",
        "\n\t$0\notherwise\nend",
    ),
    (
        "is.workflow.actions.choosefrommenu",
        "\ncase\n  ...\ncase\n  ...\nend",
        "\ncase\n\t$0\nend",
    ),
    ("is.workflow.actions.repeat.count", "\n  ...\nend", "\n\t$0\nend"),
    ("is.workflow.actions.repeat.each", "\n  ...\nend", "\n\t$0\nend"),
];

/// Apply every fixup in order. Fails on the first action or parameter that
/// is missing from the catalog.
pub fn apply_fixups(catalog: &mut Catalog) -> Result<(), CatalogError> {
    let picker = catalog.require_mut(DOCUMENT_PICKER_OPEN)?;
    let param = picker
        .parameters
        .as_mut()
        .and_then(|p| p.get_mut(DOCUMENT_PICKER_HIDDEN_PARAM))
        .ok_or_else(|| CatalogError::MissingParameter {
            action: DOCUMENT_PICKER_OPEN.to_string(),
            index: DOCUMENT_PICKER_HIDDEN_PARAM,
        })?;
    param.hidden = Some(true);

    for (id, example, completion) in BLOCK_INFO {
        catalog.require_mut(id)?.block_info = Some(BlockInfo::new(example, completion));
    }

    // "Append to Note" is the Evernote one
    catalog.require_mut(EVERNOTE_APPEND)?.app_info = Some("Evernote".to_string());
    catalog.require_mut(POST_ON_FACEBOOK)?.name = Some("Post on Facebook".to_string());

    catalog.insert(RUN_SHELL_SCRIPT, run_shell_script()?);
    catalog.insert(ASK_LLM, ask_llm()?);
    Ok(())
}

fn run_shell_script() -> Result<ActionSpec, CatalogError> {
    Ok(serde_json::from_value(json!({
        "ActionClass": "WFRunShellScriptAction",
        "ActionKeywords": ["shell", "bash", "zsh", "script", "terminal", "command", "unix", "linux"],
        "AppIdentifier": "is.workflow.actions",
        "Category": "Scripting",
        "Description": {
            "DescriptionInput": "The input passed to the shell script (stdin)",
            "DescriptionResult": "The output from the shell script (stdout)",
            "DescriptionSummary": "Runs a shell script using the specified shell."
        },
        "Input": {
            "Multiple": false,
            "Required": false,
            "Types": ["WFStringContentItem"]
        },
        "Name": "Run Shell Script",
        "Output": {
            "Multiple": false,
            "OutputName": "Shell Script Result",
            "Types": ["WFStringContentItem"]
        },
        "Parameters": [
            {
                "Class": "WFEnumerationParameter",
                "DefaultValue": "/bin/zsh",
                "Items": ["/bin/zsh", "/bin/bash", "/bin/sh", "/usr/bin/python3", "/usr/bin/perl", "/usr/bin/ruby"],
                "Key": "Shell",
                "Label": "Shell"
            },
            {
                "Class": "WFTextInputParameter",
                "Key": "Script",
                "Label": "Script",
                "Multiline": true,
                "Placeholder": "Script"
            },
            {
                "Class": "WFSwitchParameter",
                "DefaultValue": true,
                "Key": "WFInputPassthrough",
                "Label": "Pass Input"
            }
        ],
        "Subcategory": "Shell"
    }))?)
}

fn ask_llm() -> Result<ActionSpec, CatalogError> {
    Ok(serde_json::from_value(json!({
        "ActionClass": "WFAskLLMAction",
        "ActionKeywords": ["ai", "llm", "model", "apple intelligence", "chatgpt", "prompt", "generate", "ask"],
        "AppIdentifier": "is.workflow.actions",
        "Category": "Scripting",
        "Description": {
            "DescriptionSummary": "Sends a prompt to an AI model (Apple Intelligence or ChatGPT) and returns the response."
        },
        "IconName": "Scripting.png",
        "Name": "Ask LLM",
        "Output": {
            "Multiple": false,
            "OutputName": "LLM Response",
            "Types": ["NSString", "NSNumber", "WFBooleanContentItem"]
        },
        "Parameters": [
            {
                "Class": "WFEnumerationParameter",
                "DefaultValue": "Apple Intelligence",
                "Items": ["Apple Intelligence", "Apple Intelligence on Device", "ChatGPT"],
                "Key": "WFLLMModel",
                "Label": "Model"
            },
            {
                "Class": "WFTextInputParameter",
                "Key": "WFLLMPrompt",
                "Label": "Prompt",
                "Multiline": true,
                "Placeholder": "Enter your prompt..."
            },
            {
                "Class": "WFSwitchParameter",
                "DefaultValue": false,
                "Key": "WFLLMFollowUp",
                "Label": "Follow-Up"
            },
            {
                "Class": "WFEnumerationParameter",
                "DefaultValue": "Text",
                "Items": ["Text", "Boolean", "Number"],
                "Key": "WFLLMResultType",
                "Label": "Result Type"
            }
        ],
        "Subcategory": "AI"
    }))?)
}
