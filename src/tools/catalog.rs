//! Tool catalog and the hub's search / category filter.

use serde::Serialize;

/// A tool card on the hub page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tool {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub path: &'static str,
}

/// Category used to show every section.
pub const ALL_CATEGORIES: &str = "all";

/// Section order on the hub.
pub const CATEGORIES: &[&str] = &["converters", "text", "calculators"];

const TOOLS: &[Tool] = &[
    Tool {
        id: "unit-converter",
        title: "Unit Converter",
        description: "Convert length, weight, temperature, volume, area and speed.",
        category: "converters",
        path: "/tools/unit-converter.html",
    },
    Tool {
        id: "timezone-converter",
        title: "Timezone Converter",
        description: "Compare times across cities and time zones.",
        category: "converters",
        path: "/tools/timezone-converter.html",
    },
    Tool {
        id: "typing-speed-test",
        title: "Typing Speed Test",
        description: "Measure your words per minute and accuracy.",
        category: "text",
        path: "/tools/typing-speed-test.html",
    },
    Tool {
        id: "character-counter",
        title: "Character Counter",
        description: "Count characters, words, sentences and paragraphs.",
        category: "text",
        path: "/tools/character-counter.html",
    },
    Tool {
        id: "percentage-calculator",
        title: "Percentage Calculator",
        description: "Percent of a number, ratios and percentage change.",
        category: "calculators",
        path: "/tools/percentage-calculator.html",
    },
];

/// Visible cards of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub category: &'static str,
    pub tools: Vec<&'static Tool>,
}

/// What the hub shows for a search and filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogView {
    /// Non-empty sections only.
    pub sections: Vec<Section>,
    pub visible: usize,
    pub no_results: bool,
}

/// Case-insensitive substring search over title and description, combined
/// with an exact category match (`"all"` matches everything).
pub fn filter(query: &str, category: &str) -> CatalogView {
    let query = query.trim().to_lowercase();

    let matches = |tool: &Tool| {
        let in_text = tool.title.to_lowercase().contains(&query)
            || tool.description.to_lowercase().contains(&query);
        let in_category = category == ALL_CATEGORIES || category == tool.category;
        in_text && in_category
    };

    let sections: Vec<Section> = CATEGORIES
        .iter()
        .map(|&cat| Section {
            category: cat,
            tools: TOOLS
                .iter()
                .filter(|t| t.category == cat && matches(*t))
                .collect(),
        })
        .filter(|s| !s.tools.is_empty())
        .collect();

    let visible = sections.iter().map(|s| s.tools.len()).sum();
    CatalogView {
        sections,
        visible,
        no_results: visible == 0,
    }
}
