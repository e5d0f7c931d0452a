//! Headless login sequence over the Chrome DevTools Protocol.
//!
//! One call to [`LoginDriver::perform_login`] owns one browser process, one
//! incognito browser context and one page. All three are released before the
//! call returns, whichever way it returns. If the future is dropped halfway
//! (Ctrl-C), dropping the session kills the browser process.

use crate::{ChromeFinder, Error, IsolatedProfile, Result};
use autologin_core::{Configuration, Credentials, RuntimeEnvironment};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, SetLifecycleEventsEnabledParams};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use futures::{Stream, StreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Fixed wait after submitting the form, for redirects and DOM updates
pub const SETTLE_INTERVAL: Duration = Duration::from_secs(5);

/// Default bound for navigation and element interaction
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct LoginOptions {
    /// Bound for navigation, network idle and element lookups
    pub timeout: Duration,
    /// Wait after clicking the login button
    pub settle: Duration,
    /// Explicit browser binary, bypassing discovery
    pub chrome_path: Option<PathBuf>,
    /// Parent of the throwaway profile directory (system temp dir when unset)
    pub profile_root: Option<PathBuf>,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            settle: SETTLE_INTERVAL,
            chrome_path: None,
            profile_root: None,
        }
    }
}

/// Progress of the login sequence, reported to the caller as it happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStep {
    Launching,
    Navigating(String),
    WaitingForNetworkIdle,
    FillingForm,
    Submitting,
    Settling(Duration),
    CapturingContent,
    Closing,
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginStep::Launching => write!(f, "Launching headless browser..."),
            LoginStep::Navigating(url) => write!(f, "Navigating to {}...", url),
            LoginStep::WaitingForNetworkIdle => write!(f, "Waiting for network to go idle..."),
            LoginStep::FillingForm => write!(f, "Filling in login form..."),
            LoginStep::Submitting => write!(f, "Submitting login form..."),
            LoginStep::Settling(wait) => {
                write!(f, "Waiting {}s for login to process...", wait.as_secs())
            }
            LoginStep::CapturingContent => write!(f, "Reading page content..."),
            LoginStep::Closing => write!(f, "Closing browser..."),
        }
    }
}

/// Drives a single login attempt
pub struct LoginDriver<'a> {
    env: &'a RuntimeEnvironment,
    options: LoginOptions,
}

impl<'a> LoginDriver<'a> {
    pub fn new(env: &'a RuntimeEnvironment, options: LoginOptions) -> Self {
        Self { env, options }
    }

    pub fn options(&self) -> &LoginOptions {
        &self.options
    }

    /// Resolve the browser binary without launching it
    pub fn locate_browser(&self) -> Result<PathBuf> {
        if let Some(dir) = self.env.browser_runtime_dir() {
            if !dir.is_dir() {
                return Err(Error::BrowserNotFound(format!(
                    "browser runtime directory not found at: {}",
                    dir.display()
                )));
            }
        }

        ChromeFinder::new(
            self.options.chrome_path.clone(),
            self.env.browser_runtime_dir().map(Path::to_path_buf),
        )
        .find()
    }

    /// Log in with `credentials` and return the rendered page content
    /// after the settle interval
    pub async fn perform_login(
        &self,
        config: &Configuration,
        credentials: &Credentials,
        mut on_step: impl FnMut(LoginStep),
    ) -> Result<String> {
        let chrome = self.locate_browser()?;
        tracing::info!("Using browser at {}", chrome.display());

        on_step(LoginStep::Launching);
        let profile = IsolatedProfile::create_in(self.options.profile_root.as_deref())?;
        let mut session = LoginSession::launch(&chrome, &profile, &self.options).await?;

        let result = session
            .drive(config, credentials, &self.options, &mut on_step)
            .await;

        on_step(LoginStep::Closing);
        session.close().await;

        match &result {
            Ok(content) => tracing::info!("Captured {} bytes of page content", content.len()),
            Err(e) => tracing::warn!("Login sequence failed: {}", e),
        }
        result
    }
}

/// Browser process plus the CDP handler task that services it
struct LoginSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    context_id: Option<BrowserContextId>,
}

impl LoginSession {
    async fn launch(chrome: &Path, profile: &IsolatedProfile, options: &LoginOptions) -> Result<Self> {
        let config = BrowserConfig::builder()
            .chrome_executable(chrome)
            .user_data_dir(profile.path())
            .request_timeout(options.timeout)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .build()
            .map_err(Error::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Launch(e.to_string()))?;

        // The handler must be polled for any command to complete
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        tracing::debug!("Browser launched");
        Ok(Self {
            browser,
            handler_task,
            context_id: None,
        })
    }

    /// Create an incognito context and one blank page inside it
    async fn open_page(&mut self) -> Result<Page> {
        let context = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await?;
        let context_id = context.result.browser_context_id.clone();
        self.context_id = Some(context_id.clone());

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id)
            .build()
            .map_err(Error::Automation)?;

        Ok(self.browser.new_page(target).await?)
    }

    async fn drive(
        &mut self,
        config: &Configuration,
        credentials: &Credentials,
        options: &LoginOptions,
        on_step: &mut impl FnMut(LoginStep),
    ) -> Result<String> {
        let page = self.open_page().await?;

        page.execute(SetLifecycleEventsEnabledParams::new(true)).await?;
        let mut lifecycle = page.event_listener::<EventLifecycleEvent>().await?;

        on_step(LoginStep::Navigating(config.url.clone()));
        match tokio::time::timeout(options.timeout, page.goto(config.url.as_str())).await {
            Ok(result) => {
                result?;
            }
            Err(_) => return Err(Error::Timeout(format!("navigating to {}", config.url))),
        }

        on_step(LoginStep::WaitingForNetworkIdle);
        wait_for_network_idle(&page, &mut lifecycle, options.timeout).await?;

        on_step(LoginStep::FillingForm);
        let selectors = &config.selectors;
        fill(&page, &selectors.username_field, &credentials.username, options.timeout).await?;
        fill(&page, &selectors.password_field, &credentials.password, options.timeout).await?;

        on_step(LoginStep::Submitting);
        wait_for_element(&page, &selectors.login_button, options.timeout)
            .await?
            .click()
            .await?;

        on_step(LoginStep::Settling(options.settle));
        tokio::time::sleep(options.settle).await;

        on_step(LoginStep::CapturingContent);
        Ok(page.content().await?)
    }

    async fn close(mut self) {
        if let Some(context_id) = self.context_id.take() {
            if let Err(e) = self
                .browser
                .execute(DisposeBrowserContextParams::new(context_id))
                .await
            {
                tracing::debug!("Failed to dispose browser context: {}", e);
            }
        }

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Failed to wait for browser exit: {}", e);
        }

        self.handler_task.abort();
        tracing::debug!("Browser session closed");
    }
}

impl Drop for LoginSession {
    fn drop(&mut self) {
        // Browser's own Drop kills a process that is still running
        self.handler_task.abort();
    }
}

/// Wait for the `networkIdle` lifecycle event of the navigation that
/// followed subscription. Events from the previous document (before its
/// `init`) are ignored.
async fn wait_for_network_idle<S>(page: &Page, events: &mut S, timeout: Duration) -> Result<()>
where
    S: Stream<Item = Arc<EventLifecycleEvent>> + Unpin,
{
    let main_frame = page.mainframe().await?;

    let idle = async {
        let mut document_started = false;
        while let Some(event) = events.next().await {
            if main_frame.as_ref().is_some_and(|id| *id != event.frame_id) {
                continue;
            }
            tracing::debug!("Lifecycle event: {}", event.name);
            match event.name.as_str() {
                "init" => document_started = true,
                "networkIdle" if document_started => return Ok(()),
                _ => {}
            }
        }
        Err(Error::Automation(
            "page closed while waiting for network idle".to_string(),
        ))
    };

    tokio::time::timeout(timeout, idle)
        .await
        .map_err(|_| Error::Timeout("waiting for network idle".to_string()))?
}

/// Poll for `selector` until it matches or `timeout` elapses.
///
/// Only an empty match is retried; a selector the DOM rejects fails at once.
async fn wait_for_element(page: &Page, selector: &str, timeout: Duration) -> Result<Element> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(element) = first_match(page.find_elements(selector).await)? {
            return Ok(element);
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout(format!("waiting for element '{}'", selector)));
        }
        tracing::debug!("Element '{}' not present yet", selector);
        tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
    }
}

fn first_match<T>(found: std::result::Result<Vec<T>, CdpError>) -> Result<Option<T>> {
    Ok(found?.into_iter().next())
}

/// Replace the value of the input matched by `selector` with `value`
async fn fill(page: &Page, selector: &str, value: &str, timeout: Duration) -> Result<()> {
    let element = wait_for_element(page, selector, timeout).await?;
    element
        .call_js_fn("function() { this.value = ''; }", false)
        .await?;
    element.focus().await?.type_str(value).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use autologin_core::{SavedCredentials, Selectors};

    fn sample_config() -> Configuration {
        Configuration {
            url: "https://example.com/login".to_string(),
            selectors: Selectors {
                username_field: "#user".to_string(),
                password_field: "#pass".to_string(),
                login_button: "#submit".to_string(),
                login_successful: "dashboard".to_string(),
            },
            credentials: SavedCredentials::default(),
        }
    }

    fn sample_credentials() -> Credentials {
        Credentials {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
        }
    }

    #[test]
    fn test_default_options_use_fixed_settle_interval() {
        let options = LoginOptions::default();
        assert_eq!(options.settle, Duration::from_secs(5));
        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
        assert!(options.chrome_path.is_none());
        assert!(options.profile_root.is_none());
    }

    #[test]
    fn test_element_lookup_retries_only_when_nothing_matches() {
        assert_eq!(first_match(Ok(vec![7, 8])).unwrap(), Some(7));
        assert_eq!(first_match::<u32>(Ok(Vec::new())).unwrap(), None);

        let err = first_match::<u32>(Err(CdpError::ChromeMessage(
            "DOM Error while querying".to_string(),
        )))
        .unwrap_err();
        assert!(matches!(err, Error::Automation(_)));
        assert!(err.to_string().contains("DOM Error"));
    }

    #[test]
    fn test_login_step_messages() {
        assert_eq!(
            LoginStep::Navigating("https://example.com".to_string()).to_string(),
            "Navigating to https://example.com..."
        );
        assert_eq!(
            LoginStep::Settling(SETTLE_INTERVAL).to_string(),
            "Waiting 5s for login to process..."
        );
    }

    #[tokio::test]
    async fn test_missing_browser_fails_before_launch() {
        let exe_dir = tempfile::tempdir().unwrap();
        let env = RuntimeEnvironment::from_parts(exe_dir.path(), None, None);
        let options = LoginOptions {
            chrome_path: Some(PathBuf::from("/nonexistent/chrome")),
            ..LoginOptions::default()
        };

        let mut steps = Vec::new();
        let result = LoginDriver::new(&env, options)
            .perform_login(&sample_config(), &sample_credentials(), |step| steps.push(step))
            .await;

        assert!(matches!(result, Err(Error::BrowserNotFound(_))));
        assert!(steps.is_empty());
    }

    #[tokio::test]
    async fn test_missing_runtime_dir_fails_before_launch() {
        let exe_dir = tempfile::tempdir().unwrap();
        let env = RuntimeEnvironment::from_parts(
            exe_dir.path(),
            None,
            Some(exe_dir.path().join("no-browsers-here")),
        );

        let result = LoginDriver::new(&env, LoginOptions::default())
            .perform_login(&sample_config(), &sample_credentials(), |_| {})
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::BrowserNotFound(_)));
        assert!(err.to_string().contains("no-browsers-here"));
    }

    #[tokio::test]
    async fn test_navigation_timeout_releases_browser_and_profile() {
        let Ok(chrome) = ChromeFinder::new(None, None).find() else {
            println!("Skipping test - Chrome is not installed");
            return;
        };

        // Accepts connections through the backlog but never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let exe_dir = tempfile::tempdir().unwrap();
        let profile_root = tempfile::tempdir().unwrap();
        let env = RuntimeEnvironment::from_parts(exe_dir.path(), None, None);
        let options = LoginOptions {
            timeout: Duration::from_secs(1),
            chrome_path: Some(chrome),
            profile_root: Some(profile_root.path().to_path_buf()),
            ..LoginOptions::default()
        };
        let mut config = sample_config();
        config.url = format!("http://127.0.0.1:{}/login", port);

        let mut steps = Vec::new();
        let result = LoginDriver::new(&env, options)
            .perform_login(&config, &sample_credentials(), |step| steps.push(step))
            .await;

        if let Err(Error::Launch(e)) = &result {
            println!("Skipping test - browser could not be started: {}", e);
            return;
        }
        assert!(matches!(result, Err(Error::Timeout(_))), "got {:?}", result);
        assert_eq!(steps.last(), Some(&LoginStep::Closing));
        assert!(!steps.contains(&LoginStep::FillingForm));
        assert!(std::fs::read_dir(profile_root.path()).unwrap().next().is_none());
        drop(listener);
    }
}
