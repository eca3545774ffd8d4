use schannel_shared::account::{Invoice, Node, NodeId, Service, SsrInfo};

/// One field of an [`AggregateView`] together with how current it is
#[derive(Debug, Clone)]
pub enum Snapshot<T> {
    /// Fetched during the refresh that produced the view
    Fresh(T),
    /// The fetch failed, this is the value from an earlier refresh
    Stale(T),
    /// The fetch failed and there was nothing earlier to fall back on
    Missing,
}

/// Everything a front end needs to render the account after one refresh
#[derive(Debug, Clone, Default)]
pub struct AggregateView {
    pub service: Snapshot<Service>,
    pub invoices: Snapshot<Vec<Invoice>>,
    pub ssr_info: Snapshot<SsrInfo>,
    /// Always a node of `ssr_info` (when it is fresh) or `None`
    pub selection: Option<NodeId>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<T> Snapshot<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Snapshot::Fresh(value) | Snapshot::Stale(value) => Some(value),
            Snapshot::Missing => None,
        }
    }

    /// Returns `true` if the snapshot is [`Fresh`].
    ///
    /// [`Fresh`]: Snapshot::Fresh
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(..))
    }

    /// Returns `true` if the snapshot is [`Stale`].
    ///
    /// [`Stale`]: Snapshot::Stale
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(..))
    }

    /// Returns `true` if the snapshot is [`Missing`].
    ///
    /// [`Missing`]: Snapshot::Missing
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl<T: Clone> Snapshot<T> {
    /// What to show for this field when the latest fetch failed
    pub(crate) fn fallback(previous: Option<&Snapshot<T>>) -> Self {
        match previous.and_then(Snapshot::value) {
            Some(value) => Snapshot::Stale(value.clone()),
            None => Snapshot::Missing,
        }
    }
}

impl AggregateView {
    /// Returns `true` if every field came from the latest refresh
    pub fn is_complete(&self) -> bool {
        self.service.is_fresh() && self.invoices.is_fresh() && self.ssr_info.is_fresh()
    }

    /// Returns `true` if at least one field came from the latest refresh
    pub fn has_fresh_data(&self) -> bool {
        self.service.is_fresh() || self.invoices.is_fresh() || self.ssr_info.is_fresh()
    }

    pub fn unpaid_invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices
            .value()
            .into_iter()
            .flatten()
            .filter(|invoice| invoice.is_unpaid())
    }

    pub fn has_unpaid_invoices(&self) -> bool {
        self.unpaid_invoices().next().is_some()
    }

    pub fn nodes(&self) -> &[Node] {
        self.ssr_info.value().map(SsrInfo::nodes).unwrap_or_default()
    }

    pub fn selected_node(&self) -> Option<&Node> {
        let selection = self.selection.as_ref()?;
        self.ssr_info.value()?.node(selection)
    }
}
