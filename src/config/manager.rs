//! 設定管理を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    FileMatcher,
    LinguistSettings,
    MatcherError,
};

/// Workspace configuration file name.
pub const CONFIG_FILE_NAME: &str = ".linguist-lsp.json";

/// 現在の設定とワークスペースルートを保持する
///
/// 読み込みやバリデーションに失敗した場合、以前の設定はそのまま残ります。
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    settings: LinguistSettings,
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ワークスペースの `.linguist-lsp.json` を読み込む
    ///
    /// ファイルがなければデフォルト設定になります。
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        let settings = match &workspace_root {
            Some(root) => read_config_file(&root.join(CONFIG_FILE_NAME))?.unwrap_or_default(),
            None => LinguistSettings::default(),
        };
        settings.validate().map_err(ConfigError::ValidationErrors)?;

        tracing::debug!(root = ?workspace_root, ?settings, "Settings loaded");
        self.settings = settings;
        self.workspace_root = workspace_root;
        Ok(())
    }

    /// 現在のワークスペースルートから設定ファイルを読み直す
    ///
    /// # Errors
    /// [`Self::load_settings`] と同じ
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_settings(self.workspace_root.clone())
    }

    /// `didChangeConfiguration` で受け取った設定に置き換える
    ///
    /// # Errors
    /// バリデーションエラー（現在の設定は変更されない）
    pub fn update_settings(&mut self, settings: LinguistSettings) -> Result<(), ConfigError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::debug!(?settings, "Settings updated");
        self.settings = settings;
        Ok(())
    }

    #[must_use]
    pub const fn get_settings(&self) -> &LinguistSettings {
        &self.settings
    }

    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }

    /// 監視対象の設定ファイルのパス
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> {
        self.workspace_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME))
    }

    /// 現在の設定からカタログファイルのマッチャーを作る
    ///
    /// ワークスペースルートが未設定なら `None` を返します。
    ///
    /// # Errors
    /// パターンが不正な場合
    pub fn file_matcher(&self) -> Option<Result<FileMatcher, MatcherError>> {
        let root = self.workspace_root.clone()?;
        Some(FileMatcher::new(root, &self.settings))
    }
}

/// 設定ファイルを読む。存在しなければ `Ok(None)`
///
/// Windows のエディタが付ける BOM は取り除きます。
fn read_config_file(path: &Path) -> Result<Option<LinguistSettings>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No configuration file");
            return Ok(None);
        }
        Err(error) => return Err(error.into()),
    };

    tracing::debug!(path = %path.display(), "Reading configuration file");
    let settings = serde_json::from_str(content.trim_start_matches('\u{feff}'))?;
    Ok(Some(settings))
}
