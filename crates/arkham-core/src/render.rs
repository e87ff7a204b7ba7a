//! View rendering seam
//!
//! The session computes view data and hands it to a [`ViewRenderer`]. Each
//! update is independent: a renderer that cannot find the target for one of
//! them returns [`RenderError::MissingTarget`] and the session moves on to
//! the next.

use crate::error::RenderError;
use crate::status::{Status, Subsystem};
use crate::views::{AccessResults, ActivityItem, AlertTimeline, SeverityDistribution};
use arkham_store::Category;
use std::collections::BTreeMap;

/// Receives dashboard view updates
///
/// Every method defaults to accepting and ignoring the update, so a renderer
/// only implements the views it draws.
pub trait ViewRenderer: Send {
    /// Status indicator of one subsystem; `subsystem.element_id()` names the
    /// target element
    ///
    /// # Errors
    /// `RenderError::MissingTarget` if the indicator element does not exist
    fn update_status(&mut self, subsystem: Subsystem, status: Status) -> Result<(), RenderError> {
        let _ = (subsystem, status);
        Ok(())
    }

    /// Severity distribution chart
    ///
    /// # Errors
    /// Renderer specific
    fn update_severity_chart(
        &mut self,
        distribution: &SeverityDistribution,
    ) -> Result<(), RenderError> {
        let _ = distribution;
        Ok(())
    }

    /// Recent activity list
    ///
    /// # Errors
    /// Renderer specific
    fn update_recent_activity(&mut self, items: &[ActivityItem]) -> Result<(), RenderError> {
        let _ = items;
        Ok(())
    }

    /// Records per category chart
    ///
    /// # Errors
    /// Renderer specific
    fn update_category_chart(
        &mut self,
        counts: &BTreeMap<Category, usize>,
    ) -> Result<(), RenderError> {
        let _ = counts;
        Ok(())
    }

    /// Granted vs denied chart
    ///
    /// # Errors
    /// Renderer specific
    fn update_access_chart(&mut self, results: &AccessResults) -> Result<(), RenderError> {
        let _ = results;
        Ok(())
    }

    /// Alert timeline chart
    ///
    /// # Errors
    /// Renderer specific
    fn update_timeline(&mut self, timeline: &AlertTimeline) -> Result<(), RenderError> {
        let _ = timeline;
        Ok(())
    }
}

/// Renderer that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl ViewRenderer for NullRenderer {}

impl<R: ViewRenderer + ?Sized> ViewRenderer for Box<R> {
    fn update_status(&mut self, subsystem: Subsystem, status: Status) -> Result<(), RenderError> {
        (**self).update_status(subsystem, status)
    }

    fn update_severity_chart(
        &mut self,
        distribution: &SeverityDistribution,
    ) -> Result<(), RenderError> {
        (**self).update_severity_chart(distribution)
    }

    fn update_recent_activity(&mut self, items: &[ActivityItem]) -> Result<(), RenderError> {
        (**self).update_recent_activity(items)
    }

    fn update_category_chart(
        &mut self,
        counts: &BTreeMap<Category, usize>,
    ) -> Result<(), RenderError> {
        (**self).update_category_chart(counts)
    }

    fn update_access_chart(&mut self, results: &AccessResults) -> Result<(), RenderError> {
        (**self).update_access_chart(results)
    }

    fn update_timeline(&mut self, timeline: &AlertTimeline) -> Result<(), RenderError> {
        (**self).update_timeline(timeline)
    }
}
