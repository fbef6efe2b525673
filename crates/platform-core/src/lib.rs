//! Photobooth platform contracts.
//!
//! The host environment is classified once at startup into a
//! [`PlatformCapabilities`] value. Camera acquisition and export read their
//! strategy from it instead of probing the host ad hoc.
//!
//! Classification is best-effort: the user-agent string only selects a
//! constraint-negotiation strategy and an export strategy. Direct capability
//! probes (`media_devices`, `canvas`, `download_attribute`) always win over
//! user-agent guesses when they disagree.

use serde::{Deserialize, Serialize};

/// Raw facts about the host, gathered by whatever embeds the booth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEnvironment {
    /// Browser user-agent string.
    pub user_agent: String,
    /// Navigator platform string (e.g. `MacIntel`, `Win32`).
    pub platform: String,
    /// Maximum simultaneous touch points reported by the host.
    pub max_touch_points: u32,
    /// Page protocol including the colon, e.g. `https:`.
    pub protocol: String,
    /// Page hostname without port.
    pub hostname: String,
    /// Whether a camera API is exposed.
    pub media_devices: bool,
    /// Whether a 2D drawing canvas can be created.
    pub canvas: bool,
    /// Whether programmatic downloads through an anchor are honored.
    pub download_attribute: bool,
}

impl HostEnvironment {
    /// A host with every API present, served from `url`.
    pub fn from_url(user_agent: impl Into<String>, url: &str) -> Self {
        let (protocol, hostname) = split_origin(url);
        Self {
            user_agent: user_agent.into(),
            platform: String::new(),
            max_touch_points: 0,
            protocol,
            hostname,
            media_devices: true,
            canvas: true,
            download_attribute: true,
        }
    }

    /// The environment of a local native run (secure, every API present).
    pub fn local() -> Self {
        Self::from_url(
            concat!("photobooth/", env!("CARGO_PKG_VERSION")),
            "http://localhost/",
        )
    }

    pub fn with_platform(mut self, platform: impl Into<String>, max_touch_points: u32) -> Self {
        self.platform = platform.into();
        self.max_touch_points = max_touch_points;
        self
    }
}

/// Browser family, used for diagnostics and strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrowserFamily {
    Safari,
    MobileSafari,
    Chrome,
    Firefox,
    Edge,
    #[default]
    Unknown,
}

impl BrowserFamily {
    pub fn label(self) -> &'static str {
        match self {
            BrowserFamily::Safari => "Safari",
            BrowserFamily::MobileSafari => "Mobile Safari",
            BrowserFamily::Chrome => "Chrome",
            BrowserFamily::Firefox => "Firefox",
            BrowserFamily::Edge => "Edge",
            BrowserFamily::Unknown => "Unknown browser",
        }
    }
}

/// Coarse platform class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlatformClass {
    /// Phones and tablets with a touch-first browser.
    TouchHandheld,
    /// Desktop Safari, which mishandles resolution constraints.
    SafariDesktop,
    /// Everything else.
    #[default]
    Desktop,
}

/// How camera constraints are negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStrategy {
    /// Constrained front camera, then any camera, then the rear camera.
    HandheldTiered,
    /// Front camera with a preferred resolution.
    DesktopPreferred,
    /// A bare "any video" request.
    Unconstrained,
}

/// How a finished composite reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStrategy {
    /// Trigger a file download.
    Download,
    /// Open a new surface showing the image with save instructions.
    NewSurface,
}

/// Capabilities computed once from a [`HostEnvironment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    pub browser: BrowserFamily,
    pub class: PlatformClass,
    /// A camera API is present.
    pub camera_api: bool,
    /// A drawing canvas is available.
    pub canvas: bool,
    /// The page is served over a secure transport or a local-development host.
    pub secure_context: bool,
    /// Camera access on this platform is refused outside a secure context.
    pub requires_secure_context: bool,
    /// Programmatic downloads work.
    pub programmatic_download: bool,
}

impl PlatformCapabilities {
    /// Classify a host.
    pub fn detect(env: &HostEnvironment) -> Self {
        let handheld = is_touch_handheld(&env.user_agent, &env.platform, env.max_touch_points);
        let safari = is_safari_engine(&env.user_agent);

        let class = if handheld {
            PlatformClass::TouchHandheld
        } else if safari {
            PlatformClass::SafariDesktop
        } else {
            PlatformClass::Desktop
        };

        let capabilities = Self {
            browser: detect_browser(&env.user_agent),
            class,
            camera_api: env.media_devices,
            canvas: env.canvas,
            secure_context: is_secure_origin(&env.protocol, &env.hostname),
            requires_secure_context: handheld || safari,
            programmatic_download: env.download_attribute && !handheld,
        };

        tracing::debug!(
            browser = capabilities.browser.label(),
            class = ?capabilities.class,
            secure = capabilities.secure_context,
            "Classified host platform"
        );
        if !capabilities.camera_api {
            tracing::warn!(
                browser = capabilities.browser.label(),
                "Host does not expose a camera API"
            );
        }
        if !capabilities.canvas {
            tracing::warn!(
                browser = capabilities.browser.label(),
                "Host does not support canvas drawing"
            );
        }
        if capabilities.requires_secure_context && !capabilities.secure_context {
            tracing::warn!(
                browser = capabilities.browser.label(),
                "Camera access requires HTTPS on this browser"
            );
        }

        capabilities
    }

    /// Camera and canvas are both present.
    pub fn is_compatible(&self) -> bool {
        self.camera_api && self.canvas
    }

    /// Camera access is blocked by the transport requirement.
    pub fn blocked_by_insecure_context(&self) -> bool {
        self.requires_secure_context && !self.secure_context
    }

    pub fn negotiation(&self) -> NegotiationStrategy {
        match self.class {
            PlatformClass::TouchHandheld => NegotiationStrategy::HandheldTiered,
            PlatformClass::SafariDesktop => NegotiationStrategy::Unconstrained,
            PlatformClass::Desktop => NegotiationStrategy::DesktopPreferred,
        }
    }

    pub fn export_strategy(&self) -> ExportStrategy {
        if self.programmatic_download {
            ExportStrategy::Download
        } else {
            ExportStrategy::NewSurface
        }
    }

    /// Selfie previews are mirrored on handhelds.
    pub fn mirror_preview(&self) -> bool {
        self.class == PlatformClass::TouchHandheld
    }

    /// Safari-family browsers need a short pause between metadata and play.
    pub fn delays_playback(&self) -> bool {
        matches!(
            self.browser,
            BrowserFamily::Safari | BrowserFamily::MobileSafari
        ) || self.class == PlatformClass::SafariDesktop
    }

    /// Checklist for diagnostics output.
    pub fn report(&self) -> Vec<Capability> {
        vec![
            Capability {
                name: "Camera API".to_string(),
                description: "Access to a camera stream".to_string(),
                available: self.camera_api,
                required: true,
                fix_instructions: (!self.camera_api).then(|| {
                    "Use a browser with camera support such as Chrome or Firefox".to_string()
                }),
            },
            Capability {
                name: "Canvas".to_string(),
                description: "Offscreen drawing for captures and composites".to_string(),
                available: self.canvas,
                required: true,
                fix_instructions: (!self.canvas)
                    .then(|| "Enable canvas/graphics support in the browser".to_string()),
            },
            Capability {
                name: "Secure context".to_string(),
                description: "HTTPS or localhost origin".to_string(),
                available: !self.blocked_by_insecure_context(),
                required: self.requires_secure_context,
                fix_instructions: self
                    .blocked_by_insecure_context()
                    .then(|| "Serve the booth over HTTPS".to_string()),
            },
            Capability {
                name: "Programmatic download".to_string(),
                description: "Saving composites without user interaction".to_string(),
                available: self.programmatic_download,
                required: false,
                fix_instructions: (!self.programmatic_download).then(|| {
                    "Composites open in a new tab; press and hold the image to save it".to_string()
                }),
            },
        ]
    }
}

/// One line of the capability checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// Identify the browser family from a user-agent string.
pub fn detect_browser(user_agent: &str) -> BrowserFamily {
    let ua = user_agent.to_ascii_lowercase();
    if ua.contains("safari") && !ua.contains("chrome") {
        if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
            BrowserFamily::MobileSafari
        } else {
            BrowserFamily::Safari
        }
    } else if ua.contains("firefox") {
        BrowserFamily::Firefox
    } else if ua.contains("edg/") || ua.contains("edge") {
        BrowserFamily::Edge
    } else if ua.contains("chrome") {
        BrowserFamily::Chrome
    } else {
        BrowserFamily::Unknown
    }
}

/// WebKit Safari, excluding Chromium and Android browsers that also say "Safari".
pub fn is_safari_engine(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    match ua.find("safari") {
        Some(pos) => {
            let before = &ua[..pos];
            !before.contains("chrome") && !before.contains("android")
        }
        None => false,
    }
}

/// iPhone, iPod, iPad, or an iPad reporting itself as a Mac.
pub fn is_touch_handheld(user_agent: &str, platform: &str, max_touch_points: u32) -> bool {
    ["iPad", "iPhone", "iPod"]
        .iter()
        .any(|device| user_agent.contains(device))
        || (platform == "MacIntel" && max_touch_points > 1)
}

/// HTTPS, or a local-development host.
pub fn is_secure_origin(protocol: &str, hostname: &str) -> bool {
    protocol.eq_ignore_ascii_case("https:") || hostname == "localhost" || hostname == "127.0.0.1"
}

/// Split `scheme://host:port/path` into (`scheme:`, `host`).
fn split_origin(url: &str) -> (String, String) {
    let (protocol, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (format!("{}:", scheme.to_ascii_lowercase()), rest),
        None => (String::new(), url),
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let hostname = if let Some(stripped) = host.strip_prefix('[') {
        stripped.split(']').next().unwrap_or_default().to_string()
    } else {
        host.split(':').next().unwrap_or_default().to_string()
    };
    (protocol, hostname.to_ascii_lowercase())
}
