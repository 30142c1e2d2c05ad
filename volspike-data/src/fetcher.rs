use crate::{
    error::DataError,
    market::Market,
    session::SessionDate,
    snapshot::{
        CapSnapshot, MarketCap, RawSnapshot, Snapshot, SnapshotKind, Volume, VolumeSnapshot,
    },
    source::MarketDataSource,
};
use futures::future::try_join_all;
use tracing::{debug, info};

/// Fetches normalised [`Snapshot`]s from a [`MarketDataSource`].
///
/// Soft source errors (eg/ [`DataError::SnapshotUnavailable`]) become empty snapshots, fatal
/// ones (source unreachable, undecodable response) are returned to the caller.
#[derive(Debug, Clone)]
pub struct SnapshotFetcher<Source> {
    source: Source,
}

impl<Source> SnapshotFetcher<Source>
where
    Source: MarketDataSource,
{
    pub fn new(source: Source) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Traded volume per ticker for one session & market.
    pub async fn fetch_volumes(
        &self,
        session: SessionDate,
        market: Market,
    ) -> Result<VolumeSnapshot, DataError> {
        self.fetch::<Volume>(session, market).await
    }

    /// Market capitalisation per ticker for one session & market.
    pub async fn fetch_caps(
        &self,
        session: SessionDate,
        market: Market,
    ) -> Result<CapSnapshot, DataError> {
        self.fetch::<MarketCap>(session, market).await
    }

    /// Traded volume across `markets`, fetched concurrently and merged.
    pub async fn fetch_volumes_all(
        &self,
        session: SessionDate,
        markets: &[Market],
    ) -> Result<VolumeSnapshot, DataError> {
        let snapshots = try_join_all(
            markets
                .iter()
                .map(|market| self.fetch::<Volume>(session, *market)),
        )
        .await?;

        let merged = merge_all(session, snapshots);
        info!(%session, instruments = merged.len(), "fetched volume snapshot");
        Ok(merged)
    }

    /// Traded volume and market capitalisation across `markets` from a single request per
    /// market.
    pub async fn fetch_volumes_and_caps_all(
        &self,
        session: SessionDate,
        markets: &[Market],
    ) -> Result<(VolumeSnapshot, CapSnapshot), DataError> {
        let pairs = try_join_all(markets.iter().map(|market| async move {
            let raw = self.raw_or_empty(session, *market).await?;
            Ok::<_, DataError>((
                VolumeSnapshot::from_raw(session, *market, &raw),
                CapSnapshot::from_raw(session, *market, &raw),
            ))
        }))
        .await?;

        let (volumes, caps): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        let volumes = merge_all(session, volumes);
        let caps = merge_all(session, caps);

        info!(
            %session,
            instruments = volumes.len(),
            caps = caps.len(),
            "fetched volume & market cap snapshots"
        );
        Ok((volumes, caps))
    }

    /// Fetch and normalise one snapshot of the given [`SnapshotKind`].
    pub async fn fetch<Kind>(
        &self,
        session: SessionDate,
        market: Market,
    ) -> Result<Snapshot<Kind>, DataError>
    where
        Kind: SnapshotKind,
    {
        let raw = self.raw_or_empty(session, market).await?;
        Ok(Snapshot::from_raw(session, market, &raw))
    }

    async fn raw_or_empty(
        &self,
        session: SessionDate,
        market: Market,
    ) -> Result<RawSnapshot, DataError> {
        match self.source.daily_snapshot(session, market).await {
            Ok(raw) => Ok(raw),
            Err(error) if !error.is_fatal() => {
                debug!(%session, %market, %error, "treating soft source error as empty snapshot");
                Ok(RawSnapshot::default())
            }
            Err(error) => Err(error),
        }
    }
}

fn merge_all<Kind>(session: SessionDate, snapshots: Vec<Snapshot<Kind>>) -> Snapshot<Kind>
where
    Kind: SnapshotKind,
{
    snapshots
        .into_iter()
        .reduce(Snapshot::merge)
        .unwrap_or_else(|| Snapshot::new(session))
}
