//! Prompt templates.
//!
//! Both templates are filled by [`crate::template::assemble`]: `{name}` is a
//! placeholder and `{{` / `}}` are literal braces. Callers can override
//! either template from a file via [`crate::config::GeneratorConfig`]; the
//! constants here are used only when no override is provided.

/// Instruction that turns extracted SRS text into hierarchical JSON.
///
/// Placeholder: `{context}` — the text extracted from the PDF.
pub const SRS_PARSER_PROMPT: &str = r#"ROLE: You are a Quality Assurance Engineer and a System Requirement Analyst who parses SRS documents into JSON. Produce STRICT, VALID JSON only.

Goal:
- Convert an SRS excerpt into a hierarchical JSON schema with Sections → Sub_Sections (nested).
- If a parent subsection (e.g., "Service Provider Profile Management") lists actions like Register/Edit/Search that are described in their own numbered child subsections (e.g., 2.1.1, 2.1.2, 2.1.3), then:
  - Keep the parent as a SUMMARY (epic), DO NOT duplicate its fields.
  - Create separate child nodes (Type: "Action") for each leaf subsection and attach their Requirements, Fields, Validation_Rules, UI_Elements, and Flows to the appropriate leaf.

Rules:
- Preserve all section numbers exactly (e.g., "2.1.1").
- Each requirement must have REQ_ID and Description.
- Extract tables of fields into "Fields" with Constraints and Validation_Rules (mandatory, lengths, patterns, ranges, allowed values, and error responses).
- If the SRS references related subsections, fill "Related_Sub_Sections" with their IDs.
- If UI identifiers (id/xpath/name/aria-label) are present in the text, place them under "UI_Elements".
- If procedural steps exist (like "navigate → fill → submit → verify"), create a "Flows" array describing them at the leaf node.
- Keep arrays even if empty.
- Do not invent data; if missing, leave nulls or empty arrays.

Input:
{context}

Example Output:
[
  {{
    "Section_ID": "2",
    "Section_Name": "Provisioning Module",
    "Sub_Sections": [
      {{
        "Sub_Section_ID": "2.1",
        "Sub_Section_Name": "Service Provider Profile Management",
        "Requirements": [
          {{
            "REQ_ID": "REQ-SP-PRO-1",
            "Description": "SP SLA is an agreement between SDP and service provider which should be enforced before the application SLA during provisioning."
          }},
          {{
            "REQ_ID": "REQ-SP-PRO-4",
            "Description": "The SP provisioning UI shall allow users to perform actions based on access rights.",
            "Actions": ["Register new SP", "View/Edit SP profile", "Search SPs"],
            "Related_Sub_Sections": [
              {{
                "Sub_Section_ID": "2.1.1",
                "Sub_Section_Name": "Register New Service Provider"
              }},
              {{
                "Sub_Section_ID": "2.1.1.1",
                "Sub_Section_Name": "Configuration of SLA for SMS"
              }}
            ]
          }}
        ],
        "Fields": [
          {{
            "Field_Name": "SP Name",
            "Type": "Text",
            "Validation": "Mandatory, max 50 characters",
            "Error_Response": "Service Provider Name is required"
          }},
          {{
            "Field_Name": "SP ID",
            "Type": "Alphanumeric",
            "Validation": "13 characters required",
            "Error_Response": "Invalid Service Provider ID"
          }}
        ]
      }}
    ]
  }}
]

Output:
[JSON Format]
"#;

/// Instruction that asks for a feature file, a page object and step definitions.
///
/// Placeholders: `{feature_example}`, `{page_object_example}`,
/// `{steps_example}`, `{configs_example}`, `{utils_example}`,
/// `{hooks_example}`, `{srs_json}`, `{ui_json}`.
pub const TEST_GENERATION_PROMPT: &str = r#"ROLE: You are an expert QA Automation Engineer. Your expertise is in creating robust, maintainable, and comprehensive test suites using Java 21, Selenium 4, Cucumber 7, and Maven. You adhere strictly to the Page Object Model and BDD best practices.

---
CODE STYLE AND STRUCTURE EXAMPLES:
You MUST generate code that strictly follows the style, patterns, and conventions of the examples below.

**1. Feature File Example (`service_provider_registration.feature`):**
Note the use of Background, Scenario Outlines, and Examples tables.
```gherkin
{feature_example}
```

**2. Page Object Class Example (`ServiceProviderRegistrationPage.java`):**
Note the constructor, @FindBy annotations, private WebElements, and public methods for interactions and assertions. All Selenium calls are encapsulated here.
```java
{page_object_example}
```

**3. Step Definition Class Example (`ServiceProviderRegistrationSteps.java`):**
Note the dependency injection in the constructor, how it calls methods on the Page Object, and that it contains NO Selenium `driver` calls.
```java
{steps_example}
```

**4. Configuration Utility (`TestConfigs.java`):**
Use these static methods to get configuration values like URLs and credentials. Do NOT hardcode them.
Available methods include: `getBaseUrl()`, `getAdminUsername()`, `getAdminPassword()`, `getBrowser()`.
```java
{configs_example}
```

**5. General Utility (`TestUtils.java`):**
Use these static methods for common tasks like getting the driver instance (`TestUtils.getDriver()`) or creating explicit waits (`TestUtils.getWaitDriver()`)
```java
{utils_example}
```

**6. Hooks (`Hooks.java`):**
This file contains global setup and teardown logic that runs before and after each scenario.
- **`@Before`**: A new scenario is logged. The WebDriver is initialized lazily.
- **`@After`**: The scenario result is logged. A screenshot is automatically taken on failure (or success, if configured). Most importantly, the WebDriver is **always closed and cleaned up**.
- **IMPLICATION**: Do NOT generate any code for taking screenshots or closing the driver (`driver.quit()`, `driver.close()`) in the Step Definitions, as it is handled automatically by the hooks.
```java
{hooks_example}
```
---

TASK:
Generate a complete and correct set of test automation artifacts for the given feature. The output must be three separate, complete code blocks for the following files:
1.  A Cucumber `.feature` file.
2.  A Java Page Object class.
3.  A Java Step Definitions class.

INSTRUCTIONS:

**1. Correlate Requirements to UI:**
*   For each field in the **SRS JSON**, find its corresponding element in the **Page Structure JSON**.
*   Use a multi-pass strategy:
    1.  Attempt to match the SRS field key (e.g., `ServiceProviderID`) directly with an element's `id` or `name` or `selector` attribute.
    2.  If no match, perform a case-insensitive, semantic match between the SRS field key/description and the element's visible `label` text.
*   Components marked `"conditional": true` only appear in some page states (usually after a failed validation); their `error_messages` are the exact texts to assert.
*   If a clear mapping cannot be found, add a `// TODO: Manual locator needed` comment in the generated Page Object.

**2. Generate the `.feature` File:**
*   Create a `Feature:` and `Background:` section that clearly describes the user story.
*   For each field in the SRS, generate scenarios for the happy path, mandatory validation, and format/length validation based on the `validation` and `errorResponses` objects in the SRS.
*   Use `Scenario Outlines` for validation tests.

**3. Generate the Java Page Object Class:**
*   The class name must end with `Page`.
*   It **must** have a constructor that accepts `SelfHealingDriver` and `SelfHealingDriverWait`.
*   Define all UI elements as private `WebElement` fields with `@FindBy` annotations.
*   Encapsulate all Selenium actions (`.sendKeys()`, `.click()`) in public methods.

**4. Generate the Java Step Definitions Class:**
*   The class name must end with `Steps`.
*   The constructor **must** accept the Page Object class for dependency injection.
*   Step definition methods **must not** contain any `driver.findElement` or Selenium calls. They should only call methods on the Page Object instance.
*   Use JUnit 5 `Assertions.assertEquals` for assertions.

---
HERE IS THE CONTEXT FOR THE NEW FEATURE:

**SRS JSON:**
```json
{srs_json}
```

**Page Structure JSON:**
```json
{ui_json}
```
---
YOUR OUTPUT:
Provide three separate, complete, and immediately usable code blocks for the following files:
1. A new `.feature` file.
2. A new Java Page Object class.
3. A new Java Step Definitions class.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::placeholders;

    #[test]
    fn parser_prompt_has_only_context() {
        assert_eq!(placeholders(SRS_PARSER_PROMPT), vec!["context".to_string()]);
    }

    #[test]
    fn generation_prompt_placeholders() {
        assert_eq!(
            placeholders(TEST_GENERATION_PROMPT),
            vec![
                "feature_example",
                "page_object_example",
                "steps_example",
                "configs_example",
                "utils_example",
                "hooks_example",
                "srs_json",
                "ui_json",
            ]
        );
    }
}
