use tokio::sync::mpsc;
use tracing::{
    debug,
    info,
};

use crate::core::Config;

/// Instructions the controller pushes to a connected page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    PresentNext,
}

struct ConnectedHost {
    site: String,
    sender: mpsc::UnboundedSender<HostCommand>,
}

/// Pages currently connected to the controller.
#[derive(Default)]
pub struct HostRegistry {
    hosts: Vec<ConnectedHost>,
}

impl HostRegistry {
    pub fn register(&mut self, site: &str) -> mpsc::UnboundedReceiver<HostCommand> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.hosts.push(ConnectedHost { site: site.to_string(), sender });
        info!("[Hosts] Page on '{}' connected. Total pages: {}", site, self.hosts.len());
        receiver
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Tells every eligible page to present the next card. Pages that went
    /// away are dropped. Returns how many pages were told.
    pub fn present_next(&mut self, config: &Config) -> usize {
        self.hosts.retain(|host| !host.sender.is_closed());

        let mut delivered = 0;
        for host in &self.hosts {
            if !config.allows_site(&host.site) {
                debug!("[Hosts] Skipping '{}': reminders disabled for it", host.site);
                continue;
            }
            if host.sender.send(HostCommand::PresentNext).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_next_respects_config_and_prunes() {
        let mut registry = HostRegistry::default();
        let mut news = registry.register("news.example");
        let mut mail = registry.register("mail.example");
        let gone = registry.register("gone.example");
        drop(gone);

        let config =
            Config { excluded_sites: vec!["mail.example".to_string()], ..Config::default() };
        assert_eq!(registry.present_next(&config), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(news.try_recv().ok(), Some(HostCommand::PresentNext));
        assert!(mail.try_recv().is_err());

        let disabled = Config { enabled: false, ..Config::default() };
        assert_eq!(registry.present_next(&disabled), 0);
        assert!(news.try_recv().is_err());
    }
}
