//! Starter templates written to a fresh library.

use super::model::{NewTemplate, TemplateCategory};

/// The templates seeded the first time a library is opened.
#[must_use]
pub fn default_templates() -> Vec<NewTemplate> {
    vec![
        NewTemplate::new(
            "Bug Fix Investigation",
            TemplateCategory::Debugging,
            BUG_FIX,
        )
        .with_description("Systematically investigate and fix a bug")
        .with_tags(["debugging", "bug-fix", "troubleshooting"]),
        NewTemplate::new("Code Refactoring", TemplateCategory::Refactoring, REFACTOR)
            .with_description("Request code refactoring with specific goals")
            .with_tags(["refactoring", "code-quality", "clean-code"]),
        NewTemplate::new("Unit Test Generation", TemplateCategory::Testing, UNIT_TESTS)
            .with_description("Generate comprehensive unit tests for a function or class")
            .with_tags(["testing", "unit-tests", "quality-assurance"]),
        NewTemplate::new(
            "Function Documentation",
            TemplateCategory::Documentation,
            FUNCTION_DOCS,
        )
        .with_description("Generate comprehensive documentation for a function")
        .with_tags(["documentation", "comments", "api-docs"]),
        NewTemplate::new(
            "Performance Optimization",
            TemplateCategory::Optimization,
            PERFORMANCE,
        )
        .with_description("Analyze and optimize code performance")
        .with_tags(["optimization", "performance", "efficiency"]),
        NewTemplate::new("Code Review Request", TemplateCategory::General, CODE_REVIEW)
            .with_description("Request a thorough code review")
            .with_tags(["code-review", "quality", "best-practices"]),
        NewTemplate::new(
            "API Endpoint Implementation",
            TemplateCategory::General,
            API_ENDPOINT,
        )
        .with_description("Scaffold a new API endpoint with best practices")
        .with_tags(["api", "backend", "rest", "endpoints"]),
        NewTemplate::new(
            "React Component Creation",
            TemplateCategory::General,
            REACT_COMPONENT,
        )
        .with_description("Create a new React component with TypeScript")
        .with_tags(["react", "typescript", "frontend", "component"]),
    ]
}

const BUG_FIX: &str = "I've encountered a bug in {{fileName:File name}}:

**Expected Behavior:**
{{expectedBehavior:What should happen}}

**Actual Behavior:**
{{actualBehavior:What actually happens}}

**Steps to Reproduce:**
{{steps:Steps to reproduce the issue}}

**Additional Context:**
{{context:Any relevant context or error messages}}

Please help me:
1. Identify the root cause
2. Suggest a fix
3. Explain why this happened
4. Recommend tests to prevent regression";

const REFACTOR: &str = "Please refactor the following code in {{fileName:File or function name}}:

**Current Issues:**
{{issues:What problems need to be addressed}}

**Goals:**
- Improve readability
- Enhance maintainability
- {{customGoal:Any specific refactoring goals:Follow best practices}}

**Constraints:**
{{constraints:Any constraints or requirements:Maintain backward compatibility}}

Please provide:
1. Refactored code
2. Explanation of changes
3. Benefits of the new approach";

const UNIT_TESTS: &str = "Please create comprehensive unit tests for {{targetName:Function/Class name}}:

**Test Framework:**
{{framework:Testing framework:Jest}}

**Coverage Goals:**
- Edge cases
- Error handling
- Happy path scenarios
- {{customCoverage:Additional test scenarios:Boundary conditions}}

**Requirements:**
- Use descriptive test names
- Include comments explaining complex test cases
- Aim for {{coverage:Coverage percentage:90%}} code coverage
- Follow AAA pattern (Arrange, Act, Assert)";

const FUNCTION_DOCS: &str = "Please create detailed documentation for the function {{functionName:Function name}}:

**Include:**
- Brief description of purpose
- Parameter descriptions with types
- Return value description
- Usage examples
- Edge cases and error handling
- {{additional:Additional requirements:Performance considerations}}

**Format:**
{{format:Documentation format:JSDoc}}

Please ensure the documentation is:
- Clear and concise
- Suitable for both developers and automated doc generators
- Includes practical examples";

const PERFORMANCE: &str = "Please analyze and optimize the performance of {{target:Code section or file}}:

**Current Performance Issue:**
{{issue:Describe the performance problem}}

**Metrics:**
- Current: {{currentMetric:Current performance metric}}
- Target: {{targetMetric:Target performance goal}}

**Constraints:**
{{constraints:Any constraints:Must maintain existing API}}

Please provide:
1. Performance bottleneck analysis
2. Optimization recommendations with code examples
3. Expected performance improvements
4. Trade-offs to consider
5. Benchmarking suggestions";

const CODE_REVIEW: &str = "Please review this code for {{purpose:Purpose of the code}}:

**Focus Areas:**
- Code quality and best practices
- Security vulnerabilities
- Performance issues
- Error handling
- {{customFocus:Additional focus areas:Accessibility}}

**Context:**
{{context:Additional context about the code}}

Please provide:
1. Overall assessment
2. Specific issues found (with severity ratings)
3. Improvement suggestions with code examples
4. Positive aspects worth highlighting";

const API_ENDPOINT: &str = "Please implement a new API endpoint:

**Endpoint Details:**
- Method: {{method:HTTP method:GET}}
- Path: {{path:API path:/api/v1/}}
- Purpose: {{purpose:What this endpoint does}}

**Requirements:**
- Input validation
- Error handling
- Authentication/Authorization: {{auth:Auth requirements:JWT}}
- Response format: {{format:Response format:JSON}}
- {{additional:Additional requirements:Rate limiting}}

**Framework:**
{{framework:Backend framework:Express}}

Please include:
1. Route handler implementation
2. Input validation schema
3. Error handling
4. Tests
5. API documentation";

const REACT_COMPONENT: &str = "Please create a React component named {{componentName:Component name}}:

**Purpose:**
{{purpose:What this component does}}

**Props:**
{{props:List of props and their types}}

**Requirements:**
- TypeScript
- Functional component with hooks
- {{styling:Styling approach:CSS modules}}
- Accessibility (a11y) best practices
- {{additional:Additional requirements:Responsive design}}

**State Management:**
{{stateManagement:State management approach:Local useState}}

Please include:
1. Component implementation
2. Props interface
3. Basic styling
4. Usage example
5. Unit tests";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::placeholder::extract_variables;

    #[test]
    fn eight_defaults_with_unique_names() {
        let defaults = default_templates();
        assert_eq!(defaults.len(), 8);
        let names: std::collections::HashSet<_> = defaults.iter().map(|t| &t.name).collect();
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn every_default_has_placeholders_and_tags() {
        for template in default_templates() {
            assert!(!extract_variables(&template.content).is_empty(), "{}", template.name);
            assert!(!template.tags.is_empty(), "{}", template.name);
            assert!(template.description.is_some());
        }
    }

    #[test]
    fn seeded_defaults_are_read() {
        let defaults = default_templates();
        let tests = defaults
            .iter()
            .find(|t| t.name == "Unit Test Generation")
            .unwrap();
        let vars = extract_variables(&tests.content);
        let coverage = vars.iter().find(|v| v.name == "coverage").unwrap();
        assert_eq!(coverage.description.as_deref(), Some("Coverage percentage"));
        assert_eq!(coverage.default_value.as_deref(), Some("90%"));
    }

    #[test]
    fn api_path_default_keeps_slashes() {
        let defaults = default_templates();
        let api = defaults
            .iter()
            .find(|t| t.name == "API Endpoint Implementation")
            .unwrap();
        let vars = extract_variables(&api.content);
        let path = vars.iter().find(|v| v.name == "path").unwrap();
        assert_eq!(path.default_value.as_deref(), Some("/api/v1/"));
    }

    #[test]
    fn no_seeded_default_starts_with_colon() {
        for template in default_templates() {
            for var in extract_variables(&template.content) {
                let default = var.default_value.unwrap_or_default();
                assert!(!default.starts_with(':'), "{}: {}", template.name, var.name);
            }
        }
    }
}
