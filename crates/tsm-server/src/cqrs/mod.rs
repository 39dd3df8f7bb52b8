//! Mediator registry
//!
//! Registers one handler per command and query so requests can be
//! dispatched by type. Routes call the same `handle` functions directly.

pub use mediator::DefaultAsyncMediator;

use crate::features::FeatureState;

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(state: FeatureState) -> AppMediator {
    let pool = state.db.clone();

    DefaultAsyncMediator::builder()
        // Files
        .add_handler({
            let provider = state.ingestion.clone();
            let limits = state.limits;
            move |cmd| {
                let provider = provider.clone();
                async move { crate::features::files::commands::upload::handle(provider, limits, cmd).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::files::queries::list::handle(pool, query).await }
            }
        })
        // Results
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::results::queries::filter::handle(pool, query).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::results::queries::list::handle(pool, query).await }
            }
        })
        // Values
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move { crate::features::values::queries::latest::handle(pool, query).await }
            }
        })
        .build()
}
