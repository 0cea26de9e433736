//! AppStream 2.0 region enumeration
//!
//! The monitor covers every AppStream region of the partition its home
//! region belongs to.

use crate::error::ConfigError;
use anyhow::{Result, bail};

// Taken from the AppStream 2.0 service endpoints page of the AWS General
// Reference. The SDK has no listing of the regions a service runs in, so
// these tables have to be extended by hand when AppStream 2.0 launches in
// a new region.

/// AppStream 2.0 regions of the commercial partition
const AWS_REGIONS: &[&str] = &[
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-south-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ca-central-1",
    "eu-central-1",
    "eu-west-1",
    "eu-west-2",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-west-2",
];

/// AppStream 2.0 regions of the China partition
const AWS_CN_REGIONS: &[&str] = &["cn-north-1"];

/// AppStream 2.0 regions of the GovCloud partition
const AWS_US_GOV_REGIONS: &[&str] = &["us-gov-east-1", "us-gov-west-1"];

/// AWS partitions the monitor can run in
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Partition {
    #[display("aws")]
    Aws,
    #[display("aws-cn")]
    AwsCn,
    #[display("aws-us-gov")]
    AwsUsGov,
}

impl Partition {
    /// Resolve the partition a region belongs to
    pub fn for_region(region: &str) -> Self {
        if region.starts_with("cn-") {
            Partition::AwsCn
        } else if region.starts_with("us-gov-") {
            Partition::AwsUsGov
        } else {
            Partition::Aws
        }
    }

    /// AppStream 2.0 regions in this partition
    pub fn appstream_regions(self) -> &'static [&'static str] {
        match self {
            Partition::Aws => AWS_REGIONS,
            Partition::AwsCn => AWS_CN_REGIONS,
            Partition::AwsUsGov => AWS_US_GOV_REGIONS,
        }
    }
}

/// Regions to monitor, given the home region of the invocation
pub fn supported_regions(home_region: &str) -> Result<Vec<String>> {
    if home_region.trim().is_empty() {
        bail!("home region is empty; set AWS_REGION");
    }
    let partition = Partition::for_region(home_region);
    Ok(partition
        .appstream_regions()
        .iter()
        .map(|r| r.to_string())
        .collect())
}

/// Regions of one pass: all supported regions, or the requested subset.
///
/// Requested regions outside the home partition are rejected rather than
/// silently skipped.
pub fn select_regions(home_region: &str, requested: &[String]) -> Result<Vec<String>> {
    let supported = supported_regions(home_region)?;
    if requested.is_empty() {
        return Ok(supported);
    }

    for region in requested {
        if !supported.contains(region) {
            return Err(ConfigError::UnsupportedRegion {
                region: region.clone(),
                partition: Partition::for_region(home_region).to_string(),
            }
            .into());
        }
    }
    // Keep the table order so passes are reproducible
    Ok(supported
        .into_iter()
        .filter(|r| requested.contains(r))
        .collect())
}
