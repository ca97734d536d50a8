//! Backend resources, their endpoints and name lookup.

use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

/// A named collection of records on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
  Categories,
  Subcategories,
  Memberships,
  SponsoredListings,
  Newsletter,
  NewsletterData,
  Contacts,
  MembershipRequests,
}

/// Static description of a resource: how it is named and where it lives.
#[derive(Debug)]
pub struct ResourceInfo {
  pub resource: Resource,
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// List endpoint, relative to `/api/`
  pub list_path: &'static str,
  /// Whether reads need a bearer token
  pub read_requires_auth: bool,
}

/// All known resources, in navigation order.
pub const RESOURCES: &[ResourceInfo] = &[
  ResourceInfo {
    resource: Resource::Categories,
    name: "categories",
    aliases: &["c", "cat", "category"],
    description: "Product categories",
    list_path: "categories",
    read_requires_auth: false,
  },
  ResourceInfo {
    resource: Resource::Subcategories,
    name: "subcategories",
    aliases: &["sc", "sub", "subcategory"],
    description: "Subcategories under a category",
    list_path: "subcategories",
    read_requires_auth: false,
  },
  ResourceInfo {
    resource: Resource::Memberships,
    name: "memberships",
    aliases: &["m", "membership", "plans"],
    description: "Membership plans",
    list_path: "memberships",
    read_requires_auth: false,
  },
  ResourceInfo {
    resource: Resource::SponsoredListings,
    name: "sponsored-listings",
    aliases: &["sl", "sponsored", "listings"],
    description: "Sponsored listing plans",
    list_path: "admin/sponsoredlisting",
    read_requires_auth: true,
  },
  ResourceInfo {
    resource: Resource::Newsletter,
    name: "newsletter",
    aliases: &["n", "subscribers", "news"],
    description: "Newsletter subscribers",
    list_path: "newsletter",
    read_requires_auth: false,
  },
  ResourceInfo {
    resource: Resource::NewsletterData,
    name: "newsletter-data",
    aliases: &["nd", "campaigns"],
    description: "Sent newsletter emails",
    list_path: "admin/newsletterData",
    read_requires_auth: true,
  },
  ResourceInfo {
    resource: Resource::Contacts,
    name: "contacts",
    aliases: &["ct", "contact", "support"],
    description: "Help and support messages",
    list_path: "contact",
    read_requires_auth: true,
  },
  ResourceInfo {
    resource: Resource::MembershipRequests,
    name: "membership-requests",
    aliases: &["mr", "requests"],
    description: "Membership purchase requests",
    list_path: "membership/details/all",
    read_requires_auth: false,
  },
];

impl Resource {
  /// Row of this resource in [`RESOURCES`].
  fn index(self) -> usize {
    match self {
      Resource::Categories => 0,
      Resource::Subcategories => 1,
      Resource::Memberships => 2,
      Resource::SponsoredListings => 3,
      Resource::Newsletter => 4,
      Resource::NewsletterData => 5,
      Resource::Contacts => 6,
      Resource::MembershipRequests => 7,
    }
  }

  pub fn info(self) -> &'static ResourceInfo {
    &RESOURCES[self.index()]
  }

  pub fn name(self) -> &'static str {
    self.info().name
  }

  pub fn list_path(self) -> &'static str {
    self.info().list_path
  }

  /// Endpoint for fetching a single record.
  pub fn record_path(self, id: &str) -> String {
    let id = encode_segment(id);
    match self {
      Resource::MembershipRequests => format!("membership/details/{}", id),
      _ => format!("{}/{}", self.list_path(), id),
    }
  }

  /// Endpoint for creating a record, `None` if the backend does not allow it.
  pub fn create_path(self) -> Option<&'static str> {
    match self {
      Resource::SponsoredListings => Some("admin/sponsoredlisting/create"),
      Resource::NewsletterData | Resource::Contacts | Resource::MembershipRequests => None,
      _ => Some(self.list_path()),
    }
  }

  pub fn update_path(self, id: &str) -> String {
    let segment = encode_segment(id);
    match self {
      Resource::SponsoredListings => format!("admin/sponsoredlisting/edit/{}", segment),
      Resource::MembershipRequests => format!("membership/status/edit/{}", segment),
      _ => self.record_path(id),
    }
  }

  pub fn delete_path(self, id: &str) -> String {
    self.record_path(id)
  }

  /// Next resource in navigation order, wrapping around.
  pub fn next(self) -> Resource {
    RESOURCES[(self.index() + 1) % RESOURCES.len()].resource
  }
}

/// Percent-encode a record id so it stays a single path segment.
fn encode_segment(id: &str) -> String {
  // form encoding writes spaces as '+', which a path would keep literally
  form_urlencoded::byte_serialize(id.as_bytes())
    .collect::<String>()
    .replace('+', "%20")
}

impl fmt::Display for Resource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Resource {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    get_suggestions(s)
      .first()
      .map(|info| info.resource)
      .ok_or_else(|| {
        let names: Vec<&str> = RESOURCES.iter().map(|info| info.name).collect();
        format!("unknown resource '{}', expected one of: {}", s, names.join(", "))
      })
  }
}

/// Resources matching `input`, best match first.
///
/// Matching order: exact name, exact alias, name prefix, alias prefix,
/// then substring matches.
pub fn get_suggestions(input: &str) -> Vec<&'static ResourceInfo> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return RESOURCES.iter().collect();
  }

  let mut matches: Vec<(&ResourceInfo, u32)> = Vec::new();

  for info in RESOURCES {
    if info.name == input_lower {
      matches.push((info, 0));
      continue;
    }

    if info.aliases.contains(&input_lower.as_str()) {
      matches.push((info, 1));
      continue;
    }

    if info.name.starts_with(&input_lower) {
      matches.push((info, 2));
      continue;
    }

    if info.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((info, 3));
      continue;
    }

    if info.name.contains(&input_lower) {
      matches.push((info, 4));
      continue;
    }

    if info.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((info, 5));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(info, _)| info).collect()
}
