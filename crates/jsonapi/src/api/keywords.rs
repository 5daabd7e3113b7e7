//! Reserved JSON:API member names and link relation names.

/// Link to the resource or document itself.
pub const SELF: &str = "self";

/// Link to the related resource(s) of a relationship.
pub const RELATED: &str = "related";

/// Canonical link of a resource, independent of how it was reached.
pub const CANONICAL: &str = "canonical";

/// First page of a paginated collection.
pub const FIRST: &str = "first";

/// Last page of a paginated collection.
pub const LAST: &str = "last";

/// Previous page of a paginated collection.
pub const PREV: &str = "prev";

/// Next page of a paginated collection.
pub const NEXT: &str = "next";

/// Parent of the current resource or collection.
pub const UP: &str = "up";

/// Description document of the current document.
pub const DESCRIBED_BY: &str = "describedby";

/// Path keyword that introduces relationship endpoints.
pub const RELATIONSHIPS: &str = "relationships";

/// Query parameter carrying sparse fieldsets (`fields[type]=a,b`).
pub const FIELDS: &str = "fields";

/// Query parameter carrying include paths (`include=a,b.c`).
pub const INCLUDE: &str = "include";
