//! Requests the UI surface can make of the bridge.

use crate::config::SettingsPatch;
use crate::error::{Error, Result};
use crate::files::launcher::validate_external_url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

/// One operation with its decoded arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    GetSettings,
    UpdateSettings(SettingsPatch),
    ReadFile { path: PathBuf },
    WriteFile { path: PathBuf, content: String },
    ListDirectory { path: PathBuf },
    WatchDirectory { path: PathBuf },
    UnwatchDirectory { path: PathBuf },
    PathExists { path: PathBuf },
    RecentFiles,
    OpenRecentFile { path: PathBuf },
    OpenFileDialog,
    OpenFolderDialog,
    SaveFileDialog { default_path: Option<PathBuf> },
    ShowInFolder { path: PathBuf },
    OpenExternal { url: String },
    UiReady,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PathArgs {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteArgs {
    path: PathBuf,
    content: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UrlArgs {
    url: String,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct SaveDialogArgs {
    default_path: Option<PathBuf>,
}

impl Request {
    /// Decode a request from its wire operation name and JSON arguments.
    ///
    /// Unknown operations, missing or mistyped arguments, unknown argument
    /// keys, empty paths and links with a scheme the shell must not open are
    /// all rejected with `Error::InvalidRequest`.
    /// `args` may be `null` or absent for operations without arguments.
    pub fn parse(op: &str, args: Value) -> Result<Self> {
        let request = match op {
            "getSettings" => Request::GetSettings,
            "updateSettings" => Request::UpdateSettings(decode(op, args)?),
            "readFile" => Request::ReadFile {
                path: path_arg(op, args)?,
            },
            "writeFile" => {
                let WriteArgs { path, content } = decode(op, args)?;
                Request::WriteFile {
                    path: non_empty(op, path)?,
                    content,
                }
            }
            "listDirectory" => Request::ListDirectory {
                path: path_arg(op, args)?,
            },
            "watchDirectory" => Request::WatchDirectory {
                path: path_arg(op, args)?,
            },
            "unwatchDirectory" => Request::UnwatchDirectory {
                path: path_arg(op, args)?,
            },
            "pathExists" => Request::PathExists {
                path: path_arg(op, args)?,
            },
            "recentFiles" => Request::RecentFiles,
            "openRecentFile" => Request::OpenRecentFile {
                path: path_arg(op, args)?,
            },
            "openFileDialog" => Request::OpenFileDialog,
            "openFolderDialog" => Request::OpenFolderDialog,
            "saveFileDialog" => {
                let SaveDialogArgs { default_path } = decode(op, args)?;
                Request::SaveFileDialog { default_path }
            }
            "showInFolder" => Request::ShowInFolder {
                path: path_arg(op, args)?,
            },
            "openExternal" => {
                let UrlArgs { url } = decode(op, args)?;
                validate_external_url(&url)?;
                Request::OpenExternal { url }
            }
            "uiReady" => Request::UiReady,
            other => {
                return Err(Error::InvalidRequest(format!(
                    "unknown operation `{}`",
                    other
                )))
            }
        };
        Ok(request)
    }

    /// Wire name of the operation.
    pub fn op(&self) -> &'static str {
        match self {
            Request::GetSettings => "getSettings",
            Request::UpdateSettings(_) => "updateSettings",
            Request::ReadFile { .. } => "readFile",
            Request::WriteFile { .. } => "writeFile",
            Request::ListDirectory { .. } => "listDirectory",
            Request::WatchDirectory { .. } => "watchDirectory",
            Request::UnwatchDirectory { .. } => "unwatchDirectory",
            Request::PathExists { .. } => "pathExists",
            Request::RecentFiles => "recentFiles",
            Request::OpenRecentFile { .. } => "openRecentFile",
            Request::OpenFileDialog => "openFileDialog",
            Request::OpenFolderDialog => "openFolderDialog",
            Request::SaveFileDialog { .. } => "saveFileDialog",
            Request::ShowInFolder { .. } => "showInFolder",
            Request::OpenExternal { .. } => "openExternal",
            Request::UiReady => "uiReady",
        }
    }
}

fn decode<T: DeserializeOwned>(op: &str, args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| Error::InvalidRequest(format!("bad arguments for `{}`: {}", op, e)))
}

fn path_arg(op: &str, args: Value) -> Result<PathBuf> {
    let PathArgs { path } = decode(op, args)?;
    non_empty(op, path)
}

fn non_empty(op: &str, path: PathBuf) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidRequest(format!("`{}` needs a non-empty path", op)));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path_operations() {
        let request = Request::parse("readFile", json!({"path": "/w/a.rs"})).unwrap();
        assert_eq!(
            request,
            Request::ReadFile {
                path: PathBuf::from("/w/a.rs")
            }
        );
        assert_eq!(request.op(), "readFile");
    }

    #[test]
    fn test_parse_write_file() {
        let request =
            Request::parse("writeFile", json!({"path": "/w/a.rs", "content": "fn main() {}"}))
                .unwrap();
        assert_eq!(
            request,
            Request::WriteFile {
                path: PathBuf::from("/w/a.rs"),
                content: "fn main() {}".into()
            }
        );
    }

    #[test]
    fn test_parse_update_settings_takes_patch() {
        let request = Request::parse("updateSettings", json!({"wordWrap": true})).unwrap();
        match request {
            Request::UpdateSettings(patch) => {
                assert_eq!(patch.word_wrap, Some(true));
                assert!(patch.theme.is_none());
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_parse_no_argument_operations() {
        assert_eq!(
            Request::parse("getSettings", Value::Null).unwrap(),
            Request::GetSettings
        );
        assert_eq!(Request::parse("uiReady", json!({})).unwrap(), Request::UiReady);
        assert_eq!(
            Request::parse("saveFileDialog", Value::Null).unwrap(),
            Request::SaveFileDialog { default_path: None }
        );
        assert_eq!(
            Request::parse("saveFileDialog", json!({"defaultPath": "/w/untitled.txt"})).unwrap(),
            Request::SaveFileDialog {
                default_path: Some(PathBuf::from("/w/untitled.txt"))
            }
        );
    }

    #[test]
    fn test_parse_shell_operations() {
        assert_eq!(
            Request::parse("showInFolder", json!({"path": "/w/src/main.rs"})).unwrap(),
            Request::ShowInFolder {
                path: PathBuf::from("/w/src/main.rs")
            }
        );
        assert_eq!(
            Request::parse("openExternal", json!({"url": "https://docs.rs"})).unwrap(),
            Request::OpenExternal {
                url: "https://docs.rs".into()
            }
        );

        let err = Request::parse("openExternal", json!({"url": "file:///etc/hosts"})).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let err = Request::parse("deleteEverything", Value::Null).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(err.to_string().contains("deleteEverything"));
    }

    #[test]
    fn test_malformed_arguments_rejected() {
        for (op, args) in [
            ("readFile", Value::Null),
            ("readFile", json!({"path": 42})),
            ("readFile", json!({"path": "/a", "encoding": "latin1"})),
            ("writeFile", json!({"path": "/a"})),
            ("watchDirectory", json!({"path": ""})),
            ("updateSettings", json!({"notAnOption": 1})),
            ("updateSettings", json!({"tabSize": "wide"})),
        ] {
            let err = Request::parse(op, args).unwrap_err();
            assert!(
                err.to_string().contains(op),
                "error for {} should name it: {}",
                op,
                err
            );
        }
    }
}
